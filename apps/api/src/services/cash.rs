//! Branch cash book.
//!
//! ```text
//! balance = Σ CASH_IN − Σ CASH_OUT        (OPENING/CLOSING/PETTY_CASH excluded)
//! ```

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use super::{clean, merge, merge_opt, out_of_range, require_reference};
use crate::error::{ApiError, ApiResult};
use zarmind_core::validation::validate_positive_amount;
use zarmind_core::{
    CashTransaction, CashTransactionPatch, CashTransactionQuery, Money, NewCashTransaction,
    PagedResult,
};
use zarmind_db::{new_id, Database};

/// Days covered by a summary when no `from` is given.
pub const SUMMARY_DAYS: u64 = 30;

/// `GET /financials/cash/balance`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashBalance {
    /// The requested branch, or `ALL`.
    pub branch_id: String,
    #[serde(with = "zarmind_core::money::major")]
    pub balance: Money,
}

/// `GET /financials/cash/summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(with = "zarmind_core::money::major")]
    pub total_cash_in: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub total_cash_out: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub net_cash_flow: Money,
    pub cash_in_count: i64,
    pub cash_out_count: i64,
    pub by_category: Vec<CategoryFlow>,
    /// Transactions recorded per user id.
    pub by_user: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFlow {
    pub category: String,
    #[serde(with = "zarmind_core::money::major")]
    pub cash_in: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub cash_out: Money,
}

pub struct CashService {
    db: Database,
}

impl CashService {
    pub fn new(db: &Database) -> Self {
        CashService { db: db.clone() }
    }

    /// Records a movement on behalf of `user_id`.
    pub async fn create(&self, input: NewCashTransaction, user_id: &str) -> ApiResult<CashTransaction> {
        validate_positive_amount("amount", input.amount)?;
        require_reference(self.db.branches().exists(&input.branch_id).await?, "Branch")?;

        let now = Utc::now();
        let transaction = CashTransaction {
            id: new_id(),
            kind: input.kind,
            amount: input.amount,
            transaction_date: input.transaction_date.unwrap_or(now),
            branch_id: input.branch_id,
            user_id: user_id.to_string(),
            category: clean(input.category),
            reference_type: clean(input.reference_type),
            reference_id: clean(input.reference_id),
            description: clean(input.description),
            receipt_number: clean(input.receipt_number),
            created_at: now,
            updated_at: now,
        };
        let transaction = self.db.cash().insert(&transaction).await?;
        info!(
            id = %transaction.id,
            kind = %transaction.kind,
            amount = %transaction.amount,
            "Cash transaction recorded"
        );
        Ok(transaction)
    }

    pub async fn list(
        &self,
        query: &CashTransactionQuery,
    ) -> ApiResult<PagedResult<CashTransaction>> {
        Ok(self.db.cash().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<CashTransaction> {
        Ok(self.db.cash().get(id).await?)
    }

    pub async fn update(&self, id: &str, patch: CashTransactionPatch) -> ApiResult<CashTransaction> {
        let repo = self.db.cash();
        let mut transaction = repo.get(id).await?;

        if let Some(amount) = patch.amount {
            validate_positive_amount("amount", amount)?;
        }

        merge(&mut transaction.kind, patch.kind);
        merge(&mut transaction.amount, patch.amount);
        merge(&mut transaction.transaction_date, patch.transaction_date);
        merge_opt(&mut transaction.category, patch.category);
        merge_opt(&mut transaction.reference_type, patch.reference_type);
        merge_opt(&mut transaction.reference_id, patch.reference_id);
        merge_opt(&mut transaction.description, patch.description);
        merge_opt(&mut transaction.receipt_number, patch.receipt_number);

        transaction.updated_at = Utc::now();
        repo.update(&transaction).await?;
        Ok(transaction)
    }

    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        let repo = self.db.cash();
        repo.get(id).await?;
        repo.delete(id).await?;
        info!(id = %id, "Cash transaction deleted");
        Ok(())
    }

    /// Running balance of one branch, or of every branch when none is given.
    pub async fn balance(&self, branch_id: Option<&str>) -> ApiResult<CashBalance> {
        let branch_id = branch_id.map(str::trim).filter(|b| !b.is_empty());
        let balance = self.db.cash().balance(branch_id).await?;
        Ok(CashBalance {
            branch_id: branch_id.unwrap_or("ALL").to_string(),
            balance,
        })
    }

    /// Flows over `[from, to]`, defaulting to the last [`SUMMARY_DAYS`] days.
    pub async fn summary(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        branch_id: Option<&str>,
    ) -> ApiResult<CashSummary> {
        let to = to.unwrap_or_else(|| Utc::now().date_naive());
        let from = from.unwrap_or_else(|| to.checked_sub_days(Days::new(SUMMARY_DAYS)).unwrap_or(to));
        if from > to {
            return Err(ApiError::validation("from must not be after to"));
        }

        let branch_id = branch_id.map(str::trim).filter(|b| !b.is_empty());
        let totals = self.db.cash().totals(from, to, branch_id).await?;

        let by_category = totals
            .by_category
            .into_iter()
            .map(|(category, flows)| CategoryFlow {
                category,
                cash_in: flows.get("CASH_IN").copied().unwrap_or_default(),
                cash_out: flows.get("CASH_OUT").copied().unwrap_or_default(),
            })
            .collect();

        Ok(CashSummary {
            from,
            to,
            total_cash_in: totals.cash_in.amount,
            total_cash_out: totals.cash_out.amount,
            net_cash_flow: totals
                .cash_in
                .amount
                .checked_sub(totals.cash_out.amount)
                .ok_or_else(|| out_of_range("netCashFlow"))?,
            cash_in_count: totals.cash_in.count,
            cash_out_count: totals.cash_out.count,
            by_category,
            by_user: totals.by_user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing;
    use crate::services::users::UserService;
    use chrono::{DateTime, TimeZone};
    use zarmind_core::{CashTransactionType, NewUser, User, UserRole};

    async fn clerk(db: &Database) -> User {
        UserService::new(db)
            .create(NewUser {
                email: "clerk@zarmind.test".to_string(),
                username: "clerk".to_string(),
                password: "s3cret-pass".to_string(),
                role: Some(UserRole::SalesStaff),
                ..NewUser::default()
            })
            .await
            .unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, day, 12, 0, 0).unwrap()
    }

    fn movement(branch_id: &str, kind: CashTransactionType, amount: f64, day: u32) -> NewCashTransaction {
        NewCashTransaction {
            kind,
            amount: Money::from_major(amount),
            transaction_date: Some(at(day)),
            branch_id: branch_id.to_string(),
            ..NewCashTransaction::default()
        }
    }

    #[tokio::test]
    async fn test_create_requires_branch_and_positive_amount() {
        let db = testing::database().await;
        let user = clerk(&db).await;
        let service = CashService::new(&db);

        let err = service
            .create(movement("missing", CashTransactionType::CashIn, 10.0, 1), &user.id)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Branch not found");

        let branch = testing::branch(&db, "Tabriz").await;
        let err = service
            .create(movement(&branch.id, CashTransactionType::CashIn, -5.0, 1), &user.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let t = service
            .create(movement(&branch.id, CashTransactionType::CashIn, 10.0, 1), &user.id)
            .await
            .unwrap();
        assert_eq!(t.user_id, user.id);
    }

    #[tokio::test]
    async fn test_balance_per_branch_and_overall() {
        let db = testing::database().await;
        let user = clerk(&db).await;
        let service = CashService::new(&db);
        let tabriz = testing::branch(&db, "Tabriz").await;
        let shiraz = testing::branch(&db, "Shiraz").await;

        use CashTransactionType::*;
        for (branch, kind, amount) in [
            (&tabriz, CashIn, 1000.0),
            (&tabriz, CashOut, 250.0),
            (&tabriz, OpeningBalance, 5000.0),
            (&shiraz, CashIn, 100.0),
            (&shiraz, CashOut, 300.0),
        ] {
            service
                .create(movement(&branch.id, kind, amount, 2), &user.id)
                .await
                .unwrap();
        }

        let b = service.balance(Some(&tabriz.id)).await.unwrap();
        assert_eq!(b.balance, Money::from_major(750.0));
        assert_eq!(b.branch_id, tabriz.id);

        let shiraz_balance = service.balance(Some(&shiraz.id)).await.unwrap();
        assert_eq!(shiraz_balance.balance, Money::from_major(-200.0));

        let all = service.balance(Some("  ")).await.unwrap();
        assert_eq!(all.branch_id, "ALL");
        assert_eq!(all.balance, Money::from_major(550.0));
    }

    #[tokio::test]
    async fn test_summary_nets_flows_in_period() {
        let db = testing::database().await;
        let user = clerk(&db).await;
        let service = CashService::new(&db);
        let branch = testing::branch(&db, "Tabriz").await;

        let mut sale = movement(&branch.id, CashTransactionType::CashIn, 400.0, 5);
        sale.category = Some("SALE".to_string());
        service.create(sale, &user.id).await.unwrap();
        service
            .create(movement(&branch.id, CashTransactionType::CashOut, 150.0, 6), &user.id)
            .await
            .unwrap();
        service
            .create(movement(&branch.id, CashTransactionType::CashIn, 999.0, 25), &user.id)
            .await
            .unwrap();

        let from = NaiveDate::from_ymd_opt(2024, 8, 1);
        let to = NaiveDate::from_ymd_opt(2024, 8, 10);
        let summary = service.summary(from, to, None).await.unwrap();
        assert_eq!(summary.total_cash_in, Money::from_major(400.0));
        assert_eq!(summary.net_cash_flow, Money::from_major(250.0));
        assert_eq!(summary.cash_out_count, 1);
        assert_eq!(summary.by_category.len(), 1);
        assert_eq!(summary.by_category[0].cash_in, Money::from_major(400.0));
        assert_eq!(summary.by_user[&user.id], 2);
    }
}

//! # Cash Book Repository
//!
//! Branch cash movements. Only `CASH_IN` and `CASH_OUT` rows move the
//! running balance; opening, closing and petty-cash rows are recorded for
//! reference.
//!
//! Dates are stored as RFC 3339 text, so the calendar day is
//! `substr(transaction_date, 1, 10)`.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate::{self, GroupTotal};
use crate::error::{DbError, DbResult};
use crate::query::{self, money_bound, Filter, Resource};
use zarmind_core::{
    CashTransaction, CashTransactionQuery, CashTransactionType, Money, PagedResult, SortOrder,
    DEFAULT_PAGE_LIMIT,
};

pub const CASH_TRANSACTIONS: Resource = Resource {
    entity: "Cash transaction",
    table: "cash_transactions",
    columns: "*",
    search_columns: &["description", "receipt_number", "category"],
    sort_columns: &[
        ("transactionDate", "transaction_date"),
        ("amount", "amount"),
        ("type", "type"),
        ("createdAt", "created_at"),
    ],
    default_sort: "transaction_date",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

const DAY: &str = "substr(transaction_date, 1, 10)";

/// Cash movements over a period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashTotals {
    pub cash_in: GroupTotal,
    pub cash_out: GroupTotal,
    /// `CASH_IN` and `CASH_OUT` keyed by category, for rows that have one.
    pub by_category: BTreeMap<String, BTreeMap<String, Money>>,
    /// Row count per recording user.
    pub by_user: BTreeMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: SqlitePool,
}

impl CashRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashRepository { pool }
    }

    pub async fn list(&self, q: &CashTransactionQuery) -> DbResult<PagedResult<CashTransaction>> {
        let filter = Filter::new()
            .eq_opt("branch_id", q.branch_id.as_deref())
            .eq_opt("type", q.kind)
            .eq_opt("category", q.category.as_deref())
            .eq_opt("user_id", q.user_id.as_deref())
            .range(DAY, q.from, q.to)
            .range(
                "amount",
                money_bound(q.min_amount.as_deref()),
                money_bound(q.max_amount.as_deref()),
            );
        query::paginate(&self.pool, &CASH_TRANSACTIONS, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashTransaction>> {
        query::fetch_optional(&self.pool, &CASH_TRANSACTIONS, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<CashTransaction> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(CASH_TRANSACTIONS.entity, id))
    }

    pub async fn insert(&self, t: &CashTransaction) -> DbResult<CashTransaction> {
        debug!(kind = %t.kind, amount = %t.amount, branch = %t.branch_id, "Inserting cash transaction");

        sqlx::query(
            r#"
            INSERT INTO cash_transactions (
                id, type, amount, transaction_date, branch_id, user_id, category,
                reference_type, reference_id, description, receipt_number,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&t.id)
        .bind(t.kind)
        .bind(t.amount)
        .bind(t.transaction_date)
        .bind(&t.branch_id)
        .bind(&t.user_id)
        .bind(&t.category)
        .bind(&t.reference_type)
        .bind(&t.reference_id)
        .bind(&t.description)
        .bind(&t.receipt_number)
        .bind(t.created_at)
        .bind(t.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(t.clone())
    }

    /// Branch and recording user are not rewritten.
    pub async fn update(&self, t: &CashTransaction) -> DbResult<()> {
        debug!(id = %t.id, "Updating cash transaction");

        let result = sqlx::query(
            r#"
            UPDATE cash_transactions SET
                type = ?2, amount = ?3, transaction_date = ?4, category = ?5,
                reference_type = ?6, reference_id = ?7, description = ?8,
                receipt_number = ?9, updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&t.id)
        .bind(t.kind)
        .bind(t.amount)
        .bind(t.transaction_date)
        .bind(&t.category)
        .bind(&t.reference_type)
        .bind(&t.reference_id)
        .bind(&t.description)
        .bind(&t.receipt_number)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(CASH_TRANSACTIONS.entity, &t.id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting cash transaction");

        let result = sqlx::query("DELETE FROM cash_transactions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(CASH_TRANSACTIONS.entity, id));
        }
        Ok(())
    }

    /// `Σ CASH_IN − Σ CASH_OUT`, for one branch or all of them.
    pub async fn balance(&self, branch_id: Option<&str>) -> DbResult<Money> {
        let scope = Filter::new().eq_opt("branch_id", branch_id);
        let sums = aggregate::group_sum_money_where(
            &self.pool,
            CASH_TRANSACTIONS.table,
            "type",
            "amount",
            &scope,
        )
        .await?;

        let of = |kind: CashTransactionType| sums.get(kind.as_str()).copied().unwrap_or_default();
        of(CashTransactionType::CashIn)
            .checked_sub(of(CashTransactionType::CashOut))
            .ok_or_else(|| DbError::Internal("cash balance is out of range".to_string()))
    }

    /// Totals over the calendar days `[from, to]`.
    pub async fn totals(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        branch_id: Option<&str>,
    ) -> DbResult<CashTotals> {
        let pool = &self.pool;
        let table = CASH_TRANSACTIONS.table;
        let scope = Filter::new()
            .eq_opt("branch_id", branch_id)
            .range(DAY, Some(from), Some(to));

        let by_type = aggregate::group_totals_where(pool, table, "type", "amount", &scope).await?;
        let of = |kind: CashTransactionType| by_type.get(kind.as_str()).copied().unwrap_or_default();

        let mut by_category: BTreeMap<String, BTreeMap<String, Money>> = BTreeMap::new();
        for kind in [CashTransactionType::CashIn, CashTransactionType::CashOut] {
            let scoped = scope
                .clone()
                .eq("type", kind)
                .raw("category IS NOT NULL", vec![]);
            let sums =
                aggregate::group_sum_money_where(pool, table, "category", "amount", &scoped).await?;
            for (category, amount) in sums {
                by_category
                    .entry(category)
                    .or_default()
                    .insert(kind.as_str().to_string(), amount);
            }
        }

        Ok(CashTotals {
            cash_in: of(CashTransactionType::CashIn),
            cash_out: of(CashTransactionType::CashOut),
            by_category,
            by_user: aggregate::group_count_where(pool, table, "user_id", &scope).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::user::tests::user;
    use crate::repository::{new_id, testing};
    use chrono::{DateTime, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn movement(
        branch_id: &str,
        user_id: &str,
        kind: CashTransactionType,
        amount: f64,
        when: DateTime<Utc>,
    ) -> CashTransaction {
        let now = Utc::now();
        CashTransaction {
            id: new_id(),
            kind,
            amount: Money::from_major(amount),
            transaction_date: when,
            branch_id: branch_id.to_string(),
            user_id: user_id.to_string(),
            category: None,
            reference_type: None,
            reference_id: None,
            description: None,
            receipt_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_balance_ignores_reference_rows() {
        let db = testing::database().await;
        let north = db.branches().insert(&testing::branch("N")).await.unwrap();
        let south = db.branches().insert(&testing::branch("S")).await.unwrap();
        let clerk = db.users().insert(&user("c@zarmind.ir", "clerk")).await.unwrap();
        let repo = db.cash();

        use CashTransactionType::*;
        for (branch, kind, amount) in [
            (&north, CashIn, 500.0),
            (&north, CashOut, 120.0),
            (&north, OpeningBalance, 1000.0),
            (&south, CashIn, 80.0),
            (&south, PettyCash, 15.0),
        ] {
            repo.insert(&movement(&branch.id, &clerk.id, kind, amount, at(3, 10)))
                .await
                .unwrap();
        }

        assert_eq!(repo.balance(Some(&north.id)).await.unwrap(), Money::from_major(380.0));
        assert_eq!(repo.balance(None).await.unwrap(), Money::from_major(460.0));
        assert_eq!(repo.balance(Some("missing")).await.unwrap(), Money::zero());
    }

    #[tokio::test]
    async fn test_day_range_and_category_totals() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("N")).await.unwrap();
        let clerk = db.users().insert(&user("c@zarmind.ir", "clerk")).await.unwrap();
        let repo = db.cash();

        let mut sale = movement(&branch.id, &clerk.id, CashTransactionType::CashIn, 300.0, at(10, 23));
        sale.category = Some("SALE".to_string());
        repo.insert(&sale).await.unwrap();
        let mut refund =
            movement(&branch.id, &clerk.id, CashTransactionType::CashOut, 40.0, at(11, 9));
        refund.category = Some("SALE".to_string());
        repo.insert(&refund).await.unwrap();
        repo.insert(&movement(&branch.id, &clerk.id, CashTransactionType::CashIn, 70.0, at(12, 1)))
            .await
            .unwrap();

        let q = CashTransactionQuery {
            from: NaiveDate::from_ymd_opt(2024, 6, 10),
            to: NaiveDate::from_ymd_opt(2024, 6, 11),
            ..CashTransactionQuery::default()
        };
        assert_eq!(repo.list(&q).await.unwrap().total, 2);

        let totals = repo
            .totals(
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
                Some(&branch.id),
            )
            .await
            .unwrap();
        assert_eq!(totals.cash_in.count, 2);
        assert_eq!(totals.cash_in.amount, Money::from_major(370.0));
        assert_eq!(totals.cash_out.amount, Money::from_major(40.0));
        assert_eq!(totals.by_category["SALE"]["CASH_OUT"], Money::from_major(40.0));
        assert_eq!(totals.by_category.len(), 1);
        assert_eq!(totals.by_user[&clerk.id], 3);
    }
}

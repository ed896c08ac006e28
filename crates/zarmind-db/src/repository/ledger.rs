//! # Ledger Repository
//!
//! One repository for both sides of the books. Payables and receivables
//! share a row shape and differ only in table and counterparty column:
//!
//! ```text
//! ┌──────────────┬──────────────────────┬───────────────┐
//! │ LedgerKind   │ table                │ counterparty  │
//! ├──────────────┼──────────────────────┼───────────────┤
//! │ Payable      │ accounts_payable     │ supplier_id   │
//! │ Receivable   │ accounts_receivable  │ customer_id   │
//! └──────────────┴──────────────────────┴───────────────┘
//! ```
//!
//! `remaining_amount` and `status` are stored for filtering and sorting,
//! but always written from values the caller derived with
//! [`LedgerAmounts`](zarmind_core::status::LedgerAmounts).

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate;
use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::paging::is_truthy;
use zarmind_core::{
    LedgerEntry, LedgerKind, LedgerQuery, LedgerStatus, Money, PagedResult, SortOrder,
    DEFAULT_PAGE_LIMIT,
};

const LEDGER_SORT: &[(&str, &str)] = &[
    ("invoiceDate", "invoice_date"),
    ("dueDate", "due_date"),
    ("amount", "amount"),
    ("remainingAmount", "remaining_amount"),
    ("createdAt", "created_at"),
];

pub const PAYABLES: Resource = Resource {
    entity: "Accounts payable record",
    table: "accounts_payable",
    columns: "id, supplier_id AS counterparty_id, invoice_number, invoice_date, amount, \
              paid_amount, remaining_amount, due_date, status, notes, created_at, updated_at",
    search_columns: &["invoice_number", "notes"],
    sort_columns: LEDGER_SORT,
    default_sort: "invoice_date",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

pub const RECEIVABLES: Resource = Resource {
    entity: "Accounts receivable record",
    table: "accounts_receivable",
    columns: "id, customer_id AS counterparty_id, invoice_number, invoice_date, amount, \
              paid_amount, remaining_amount, due_date, status, notes, created_at, updated_at",
    search_columns: &["invoice_number", "notes"],
    sort_columns: LEDGER_SORT,
    default_sort: "invoice_date",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

/// Balance summary for one side of the books.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTotals {
    /// Sum of remaining over every record.
    pub total_due: Money,
    /// Sum of amount over PAID records.
    pub total_paid: Money,
    /// Sum of remaining over PENDING and PARTIAL records.
    pub total_pending: Money,
    pub overdue_amount: Money,
    pub overdue_count: i64,
}

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
    kind: LedgerKind,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool, kind: LedgerKind) -> Self {
        LedgerRepository { pool, kind }
    }

    pub fn kind(&self) -> LedgerKind {
        self.kind
    }

    fn resource(&self) -> &'static Resource {
        match self.kind {
            LedgerKind::Payable => &PAYABLES,
            LedgerKind::Receivable => &RECEIVABLES,
        }
    }

    fn counterparty_column(&self) -> &'static str {
        match self.kind {
            LedgerKind::Payable => "supplier_id",
            LedgerKind::Receivable => "customer_id",
        }
    }

    /// Lists records; `overdue` is judged against `today`.
    pub async fn list(&self, q: &LedgerQuery, today: NaiveDate) -> DbResult<PagedResult<LedgerEntry>> {
        let mut filter = Filter::new()
            .eq_opt(self.counterparty_column(), q.counterparty_id.as_deref())
            .eq_opt("status", q.status)
            .range("invoice_date", q.from, q.to);
        if is_truthy(q.overdue.as_deref()) {
            filter = overdue(filter, today);
        }
        query::paginate(&self.pool, self.resource(), &filter, &q.list).await
    }

    pub async fn list_for_counterparty(&self, counterparty_id: &str) -> DbResult<Vec<LedgerEntry>> {
        let filter = Filter::new().eq(self.counterparty_column(), counterparty_id);
        query::fetch_all(&self.pool, self.resource(), &filter).await
    }

    /// PENDING and PARTIAL records, for aging.
    pub async fn open_entries(&self, counterparty_id: Option<&str>) -> DbResult<Vec<LedgerEntry>> {
        let filter = Filter::new()
            .in_list("status", [LedgerStatus::Pending, LedgerStatus::Partial])
            .eq_opt(self.counterparty_column(), counterparty_id);
        query::fetch_all(&self.pool, self.resource(), &filter).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LedgerEntry>> {
        query::fetch_optional(&self.pool, self.resource(), &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<LedgerEntry> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(self.kind.entity(), id))
    }

    pub async fn insert(&self, e: &LedgerEntry) -> DbResult<LedgerEntry> {
        debug!(kind = ?self.kind, invoice = %e.invoice_number, "Inserting ledger record");

        let sql = format!(
            r#"
            INSERT INTO {table} (
                id, {counterparty}, invoice_number, invoice_date, amount, paid_amount,
                remaining_amount, due_date, status, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            table = self.resource().table,
            counterparty = self.counterparty_column(),
        );

        sqlx::query(&sql)
            .bind(&e.id)
            .bind(&e.counterparty_id)
            .bind(&e.invoice_number)
            .bind(e.invoice_date)
            .bind(e.amount)
            .bind(e.paid_amount)
            .bind(e.remaining_amount)
            .bind(e.due_date)
            .bind(e.status)
            .bind(&e.notes)
            .bind(e.created_at)
            .bind(e.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(e.clone())
    }

    /// Full-row write of a merged record.
    pub async fn update(&self, e: &LedgerEntry) -> DbResult<()> {
        debug!(kind = ?self.kind, id = %e.id, "Updating ledger record");

        let sql = format!(
            r#"
            UPDATE {table} SET
                invoice_number = ?2, invoice_date = ?3, amount = ?4, paid_amount = ?5,
                remaining_amount = ?6, due_date = ?7, status = ?8, notes = ?9, updated_at = ?10
            WHERE id = ?1
            "#,
            table = self.resource().table,
        );

        let result = sqlx::query(&sql)
            .bind(&e.id)
            .bind(&e.invoice_number)
            .bind(e.invoice_date)
            .bind(e.amount)
            .bind(e.paid_amount)
            .bind(e.remaining_amount)
            .bind(e.due_date)
            .bind(e.status)
            .bind(&e.notes)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(self.kind.entity(), &e.id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(kind = ?self.kind, id = %id, "Deleting ledger record");

        let sql = format!("DELETE FROM {} WHERE id = ?1", self.resource().table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(self.kind.entity(), id));
        }
        Ok(())
    }

    pub async fn totals(&self, counterparty_id: Option<&str>, today: NaiveDate) -> DbResult<LedgerTotals> {
        let pool = &self.pool;
        let table = self.resource().table;
        let scope = Filter::new().eq_opt(self.counterparty_column(), counterparty_id);
        let open = scope
            .clone()
            .in_list("status", [LedgerStatus::Pending, LedgerStatus::Partial]);
        let overdue_scope = overdue(scope.clone(), today);

        Ok(LedgerTotals {
            total_due: aggregate::sum_money_where(pool, table, "remaining_amount", &scope).await?,
            total_paid: aggregate::sum_money_where(
                pool,
                table,
                "amount",
                &scope.clone().eq("status", LedgerStatus::Paid),
            )
            .await?,
            total_pending: aggregate::sum_money_where(pool, table, "remaining_amount", &open)
                .await?,
            overdue_amount: aggregate::sum_money_where(
                pool,
                table,
                "remaining_amount",
                &overdue_scope,
            )
            .await?,
            overdue_count: aggregate::count_where(pool, table, &overdue_scope).await?,
        })
    }

    /// Sum of remaining over open records.
    pub async fn outstanding(&self) -> DbResult<Money> {
        let open = Filter::new().in_list("status", [LedgerStatus::Pending, LedgerStatus::Partial]);
        aggregate::sum_money_where(&self.pool, self.resource().table, "remaining_amount", &open)
            .await
    }
}

/// Due before `today` and not fully paid.
fn overdue(filter: Filter, today: NaiveDate) -> Filter {
    filter
        .lt("due_date", today)
        .not_eq("status", LedgerStatus::Paid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::customer::tests::customer;
    use crate::repository::supplier::tests::supplier;
    use crate::repository::{new_id, testing};
    use zarmind_core::status::LedgerAmounts;
    use zarmind_core::ListParams;

    fn entry(counterparty_id: &str, invoice: &str, amount: f64, paid: f64, due: Option<NaiveDate>) -> LedgerEntry {
        let amounts = LedgerAmounts::new(Money::from_major(amount), Money::from_major(paid)).unwrap();
        let now = Utc::now();
        LedgerEntry {
            id: new_id(),
            counterparty_id: counterparty_id.to_string(),
            invoice_number: invoice.to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            amount: amounts.amount(),
            paid_amount: amounts.paid(),
            remaining_amount: amounts.remaining(),
            due_date: due,
            status: amounts.status(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[tokio::test]
    async fn test_counterparty_is_aliased_per_kind() {
        let db = testing::database().await;
        let s = db.suppliers().insert(&supplier("SUPP-1")).await.unwrap();
        let c = db.customers().insert(&customer("CUST-1", "Ali")).await.unwrap();

        let ap = db.payables().insert(&entry(&s.id, "INV-1", 1000.0, 0.0, None)).await.unwrap();
        let ar = db.receivables().insert(&entry(&c.id, "INV-2", 50.0, 0.0, None)).await.unwrap();

        assert_eq!(db.payables().get(&ap.id).await.unwrap().counterparty_id, s.id);
        assert_eq!(db.receivables().get(&ar.id).await.unwrap().counterparty_id, c.id);
        assert!(db.payables().get_by_id(&ar.id).await.unwrap().is_none());
        assert_eq!(db.suppliers().dependents(&s.id).await.unwrap(), 1);
        assert_eq!(db.customers().dependents(&c.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_counterparty_is_foreign_key_violation() {
        let db = testing::database().await;
        let err = db
            .payables()
            .insert(&entry("ghost", "INV-1", 10.0, 0.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_overdue_filter_and_totals() {
        let db = testing::database().await;
        let s = db.suppliers().insert(&supplier("SUPP-1")).await.unwrap();
        let repo = db.payables();

        repo.insert(&entry(&s.id, "LATE", 1000.0, 400.0, Some(day(1)))).await.unwrap();
        repo.insert(&entry(&s.id, "PAID", 300.0, 300.0, Some(day(1)))).await.unwrap();
        repo.insert(&entry(&s.id, "FUTURE", 200.0, 0.0, Some(day(28)))).await.unwrap();
        repo.insert(&entry(&s.id, "NODUE", 100.0, 0.0, None)).await.unwrap();

        let today = day(15);
        let q = LedgerQuery {
            overdue: Some("yes".to_string()),
            ..LedgerQuery::default()
        };
        let page = repo.list(&q, today).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].invoice_number, "LATE");

        let totals = repo.totals(Some(&s.id), today).await.unwrap();
        assert_eq!(totals.total_due, Money::from_major(900.0));
        assert_eq!(totals.total_paid, Money::from_major(300.0));
        assert_eq!(totals.total_pending, Money::from_major(900.0));
        assert_eq!(totals.overdue_amount, Money::from_major(600.0));
        assert_eq!(totals.overdue_count, 1);
        assert_eq!(repo.outstanding().await.unwrap(), Money::from_major(900.0));

        assert_eq!(repo.open_entries(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sort_by_amount_ascending() {
        let db = testing::database().await;
        let s = db.suppliers().insert(&supplier("SUPP-1")).await.unwrap();
        let repo = db.payables();

        for (invoice, amount) in [("B", 20.0), ("A", 10.0), ("C", 30.0)] {
            repo.insert(&entry(&s.id, invoice, amount, 0.0, None)).await.unwrap();
        }

        let q = LedgerQuery {
            list: ListParams::default().with_sort("amount", SortOrder::Asc),
            ..LedgerQuery::default()
        };
        let page = repo.list(&q, day(1)).await.unwrap();
        let order: Vec<_> = page.items.iter().map(|e| e.invoice_number.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }
}

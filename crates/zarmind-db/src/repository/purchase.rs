//! # Purchase Repository
//!
//! Purchase orders and their lines.
//!
//! ## Receiving Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PENDING ──receive some──► PARTIALLY_RECEIVED ──receive rest──►        │
//! │     │                                                COMPLETED         │
//! │     └────────────complete (receives remainder)──────────┘              │
//! │     │                                                                   │
//! │     └──cancel──► CANCELLED                                             │
//! │                                                                         │
//! │  Per received line (caller-ordered, sequential):                       │
//! │    1. purchase_items.received_quantity                                 │
//! │    2. branch_inventory row of the purchase's branch                    │
//! │    3. products.quantity                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate;
use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::{
    Money, PagedResult, Purchase, PurchaseItem, PurchaseQuery, PurchaseStatus, SortOrder,
    DEFAULT_PAGE_LIMIT,
};

pub const PURCHASES: Resource = Resource {
    entity: "Purchase",
    table: "purchases",
    columns: "*",
    search_columns: &["purchase_number", "notes"],
    sort_columns: &[
        ("purchaseDate", "purchase_date"),
        ("totalAmount", "total_amount"),
        ("createdAt", "created_at"),
    ],
    default_sort: "purchase_date",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

/// Period totals for purchase reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurchaseTotals {
    pub count: i64,
    pub total_amount: Money,
    pub total_paid: Money,
    pub by_status: BTreeMap<String, Money>,
}

impl PurchaseTotals {
    pub fn outstanding(&self) -> Money {
        self.total_amount - self.total_paid
    }
}

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    pub async fn list(&self, q: &PurchaseQuery) -> DbResult<PagedResult<Purchase>> {
        let filter = Filter::new()
            .eq_opt("status", q.status)
            .eq_opt("supplier_id", q.supplier_id.as_deref())
            .eq_opt("branch_id", q.branch_id.as_deref())
            .range("purchase_date", q.from, q.to);
        query::paginate(&self.pool, &PURCHASES, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        query::fetch_optional(&self.pool, &PURCHASES, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Purchase> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(PURCHASES.entity, id))
    }

    /// Inserts the header and every line in one transaction.
    pub async fn insert(&self, p: &Purchase, items: &[PurchaseItem]) -> DbResult<Purchase> {
        debug!(number = %p.purchase_number, items = items.len(), "Inserting purchase");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, purchase_number, purchase_date, supplier_id, branch_id, user_id, status,
                subtotal, tax_amount, total_amount, paid_amount, payment_method,
                delivery_date, notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&p.id)
        .bind(&p.purchase_number)
        .bind(p.purchase_date)
        .bind(&p.supplier_id)
        .bind(&p.branch_id)
        .bind(&p.user_id)
        .bind(p.status)
        .bind(p.subtotal)
        .bind(p.tax_amount)
        .bind(p.total_amount)
        .bind(p.paid_amount)
        .bind(&p.payment_method)
        .bind(p.delivery_date)
        .bind(&p.notes)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (
                    id, purchase_id, product_id, quantity, received_quantity,
                    unit_price, weight, subtotal, notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.purchase_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.received_quantity)
            .bind(item.unit_price)
            .bind(item.weight)
            .bind(item.subtotal)
            .bind(&item.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(p.clone())
    }

    /// Header fields only; status moves through [`set_status`](Self::set_status).
    pub async fn update(&self, p: &Purchase) -> DbResult<()> {
        debug!(id = %p.id, "Updating purchase");

        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                purchase_date = ?2, delivery_date = ?3, payment_method = ?4,
                paid_amount = ?5, notes = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&p.id)
        .bind(p.purchase_date)
        .bind(p.delivery_date)
        .bind(&p.payment_method)
        .bind(p.paid_amount)
        .bind(&p.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PURCHASES.entity, &p.id));
        }
        Ok(())
    }

    pub async fn set_status(
        &self,
        id: &str,
        status: PurchaseStatus,
        notes: Option<&str>,
    ) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting purchase status");

        let result = sqlx::query(
            "UPDATE purchases SET status = ?2, notes = COALESCE(?3, notes), updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PURCHASES.entity, id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting purchase");

        let result = sqlx::query("DELETE FROM purchases WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PURCHASES.entity, id));
        }
        Ok(())
    }

    // =========================================================================
    // Lines
    // =========================================================================

    pub async fn items(&self, purchase_id: &str) -> DbResult<Vec<PurchaseItem>> {
        let items = sqlx::query_as::<_, PurchaseItem>(
            "SELECT * FROM purchase_items WHERE purchase_id = ?1 ORDER BY rowid",
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Writes an already validated received quantity.
    pub async fn set_received(&self, item_id: &str, received: i64, notes: Option<&str>) -> DbResult<()> {
        debug!(id = %item_id, received, "Setting received quantity");

        let result = sqlx::query(
            "UPDATE purchase_items SET received_quantity = ?2, notes = COALESCE(?3, notes) WHERE id = ?1",
        )
        .bind(item_id)
        .bind(received)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase item", item_id));
        }
        Ok(())
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    pub async fn totals(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        branch_id: Option<&str>,
    ) -> DbResult<PurchaseTotals> {
        let pool = &self.pool;
        let scope = Filter::new()
            .range("purchase_date", Some(from), Some(to))
            .eq_opt("branch_id", branch_id);

        Ok(PurchaseTotals {
            count: aggregate::count_where(pool, "purchases", &scope).await?,
            total_amount: aggregate::sum_money_where(pool, "purchases", "total_amount", &scope)
                .await?,
            total_paid: aggregate::sum_money_where(pool, "purchases", "paid_amount", &scope)
                .await?,
            by_status: aggregate::group_sum_money_where(
                pool,
                "purchases",
                "status",
                "total_amount",
                &scope,
            )
            .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::tests::product;
    use crate::repository::user::tests::user;
    use crate::repository::{new_id, testing};

    fn purchase(branch_id: &str, user_id: &str, number: &str, date: NaiveDate) -> Purchase {
        let now = Utc::now();
        Purchase {
            id: new_id(),
            purchase_number: number.to_string(),
            purchase_date: date,
            supplier_id: None,
            branch_id: branch_id.to_string(),
            user_id: user_id.to_string(),
            status: PurchaseStatus::Pending,
            subtotal: Money::from_major(500.0),
            tax_amount: Money::zero(),
            total_amount: Money::from_major(500.0),
            paid_amount: Money::from_major(100.0),
            payment_method: None,
            delivery_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(purchase_id: &str, product_id: &str, quantity: i64) -> PurchaseItem {
        PurchaseItem {
            id: new_id(),
            purchase_id: purchase_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            received_quantity: 0,
            unit_price: Money::from_major(100.0),
            weight: None,
            subtotal: Money::from_major(100.0).multiply_quantity(quantity).expect("fixture subtotal overflow"),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_insert_receive_and_cascade_delete() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let u = db.users().insert(&user("buyer@zarmind.test", "buyer")).await.unwrap();
        let p = product("PROD-1", 0);
        db.products().insert(&p, &[]).await.unwrap();
        let repo = db.purchases();

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let order = purchase(&branch.id, &u.id, "PUR-1", date);
        let line = item(&order.id, &p.id, 5);
        repo.insert(&order, &[line.clone()]).await.unwrap();

        repo.set_received(&line.id, 3, None).await.unwrap();
        let items = repo.items(&order.id).await.unwrap();
        assert_eq!(items[0].received_quantity, 3);
        assert_eq!(items[0].outstanding(), 2);
        assert_eq!(db.products().dependents(&p.id).await.unwrap(), 1);

        repo.set_status(&order.id, PurchaseStatus::PartiallyReceived, Some("part"))
            .await
            .unwrap();
        let stored = repo.get(&order.id).await.unwrap();
        assert_eq!(stored.status, PurchaseStatus::PartiallyReceived);
        assert_eq!(stored.notes.as_deref(), Some("part"));

        repo.delete(&order.id).await.unwrap();
        assert!(repo.items(&order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_over_receiving_violates_check() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let u = db.users().insert(&user("buyer@zarmind.test", "buyer")).await.unwrap();
        let p = product("PROD-1", 0);
        db.products().insert(&p, &[]).await.unwrap();
        let repo = db.purchases();

        let order = purchase(&branch.id, &u.id, "PUR-1", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let line = item(&order.id, &p.id, 2);
        repo.insert(&order, &[line.clone()]).await.unwrap();

        assert!(matches!(
            repo.set_received(&line.id, 3, None).await,
            Err(DbError::CheckViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_totals_for_period() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let u = db.users().insert(&user("buyer@zarmind.test", "buyer")).await.unwrap();
        let repo = db.purchases();

        let may = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        repo.insert(&purchase(&branch.id, &u.id, "PUR-1", may(1)), &[]).await.unwrap();
        repo.insert(&purchase(&branch.id, &u.id, "PUR-2", may(20)), &[]).await.unwrap();
        repo.insert(&purchase(&branch.id, &u.id, "PUR-3", may(31)), &[]).await.unwrap();

        let totals = repo.totals(may(1), may(20), None).await.unwrap();
        assert_eq!(totals.count, 2);
        assert_eq!(totals.total_amount, Money::from_major(1000.0));
        assert_eq!(totals.total_paid, Money::from_major(200.0));
        assert_eq!(totals.outstanding(), Money::from_major(800.0));
        assert_eq!(totals.by_status.get("PENDING"), Some(&Money::from_major(1000.0)));

        let q = PurchaseQuery {
            from: Some(may(2)),
            ..PurchaseQuery::default()
        };
        assert_eq!(repo.list(&q).await.unwrap().total, 2);
    }
}

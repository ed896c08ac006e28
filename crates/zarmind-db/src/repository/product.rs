//! # Product Repository
//!
//! Inventory items and their per-branch stock rows.
//!
//! ## Stock Counters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.quantity          item-level counter                         │
//! │       ▲                       moved by adjustments and receipts        │
//! │       │                                                                 │
//! │  branch_inventory.quantity  per-branch counter (one row per branch)    │
//! │                               summed for display as totalBranchQuantity│
//! │                                                                         │
//! │  Both columns carry CHECK (quantity >= 0). Callers still verify the    │
//! │  delta first, so a rejected adjustment writes nothing at all.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate;
use crate::error::{DbError, DbResult};
use crate::query::{self, number_bound, Filter, Resource, SqlValue};
use zarmind_core::{
    BranchStock, LowStockItem, Money, PagedResult, Product, ProductQuery, ProductStatus,
    SortOrder, DEFAULT_PAGE_LIMIT,
};

pub const PRODUCTS: Resource = Resource {
    entity: "Product",
    table: "products",
    columns: "*",
    search_columns: &["sku", "name", "qr_code", "description"],
    sort_columns: &[
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
        ("purchasePrice", "purchase_price"),
        ("sellingPrice", "selling_price"),
        ("quantity", "quantity"),
        ("name", "name"),
    ],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

const STOCK_AT_BRANCH: &str =
    "EXISTS (SELECT 1 FROM branch_inventory bi WHERE bi.product_id = products.id AND bi.branch_id = ?)";

/// Inventory valuation, optionally scoped to one branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryTotals {
    pub item_count: i64,
    pub total_quantity: i64,
    pub total_purchase_value: Money,
    pub total_selling_value: Money,
    /// Quantity per category.
    pub by_category: BTreeMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn list(&self, q: &ProductQuery) -> DbResult<PagedResult<Product>> {

        let mut filter = Filter::new()
            .eq_opt("category", q.category)
            .eq_opt("status", q.status)
            .range(
                "quantity",
                number_bound(q.min_quantity.as_deref()),
                number_bound(q.max_quantity.as_deref()),
            )
            .eq_opt("gold_purity", q.gold_purity.as_deref())
            .eq_opt("coin_type", q.coin_type.as_deref());
        if let Some(branch_id) = q.branch_id.as_deref() {
            filter = filter.raw(STOCK_AT_BRANCH, vec![SqlValue::from(branch_id)]);
        }

        query::paginate(&self.pool, &PRODUCTS, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        query::fetch_optional(&self.pool, &PRODUCTS, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(PRODUCTS.entity, id))
    }

    pub async fn get_by_qr(&self, qr_code: &str) -> DbResult<Option<Product>> {
        query::fetch_optional(&self.pool, &PRODUCTS, &Filter::new().eq("qr_code", qr_code)).await
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    /// Inserts the item and its opening stock rows in one transaction.
    pub async fn insert(&self, p: &Product, stock: &[BranchStock]) -> DbResult<Product> {
        debug!(sku = %p.sku, branches = stock.len(), "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, qr_code, name, description, category, status, weight,
                gold_purity, coin_type, currency_code, purchase_price, selling_price,
                quantity, workshop_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17
            )
            "#,
        )
        .bind(&p.id)
        .bind(&p.sku)
        .bind(&p.qr_code)
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.category)
        .bind(p.status)
        .bind(p.weight)
        .bind(&p.gold_purity)
        .bind(&p.coin_type)
        .bind(&p.currency_code)
        .bind(p.purchase_price)
        .bind(p.selling_price)
        .bind(p.quantity)
        .bind(&p.workshop_id)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&mut *tx)
        .await?;

        for row in stock {
            insert_stock_row(&mut tx, row).await?;
        }

        tx.commit().await?;
        Ok(p.clone())
    }

    pub async fn update(&self, p: &Product) -> DbResult<()> {
        debug!(id = %p.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2, description = ?3, status = ?4, weight = ?5, gold_purity = ?6,
                coin_type = ?7, currency_code = ?8, purchase_price = ?9, selling_price = ?10,
                workshop_id = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&p.id)
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.status)
        .bind(p.weight)
        .bind(&p.gold_purity)
        .bind(&p.coin_type)
        .bind(&p.currency_code)
        .bind(p.purchase_price)
        .bind(p.selling_price)
        .bind(&p.workshop_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PRODUCTS.entity, &p.id));
        }
        Ok(())
    }

    /// Writes an already validated item quantity.
    pub async fn set_quantity(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity, "Setting product quantity");

        let result = sqlx::query("UPDATE products SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PRODUCTS.entity, id));
        }
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: ProductStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting product status");

        let result = sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PRODUCTS.entity, id));
        }
        Ok(())
    }

    /// Purchase lines referencing the item.
    pub async fn dependents(&self, id: &str) -> DbResult<i64> {
        aggregate::count_where(&self.pool, "purchase_items", &Filter::new().eq("product_id", id))
            .await
    }

    /// Deletes the stock rows, then the item.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM branch_inventory WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PRODUCTS.entity, id));
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Branch Inventory
    // =========================================================================

    pub async fn stock(&self, product_id: &str) -> DbResult<Vec<BranchStock>> {
        let rows = sqlx::query_as::<_, BranchStock>(
            "SELECT * FROM branch_inventory WHERE product_id = ?1 ORDER BY branch_id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn stock_at(&self, product_id: &str, branch_id: &str) -> DbResult<Option<BranchStock>> {
        let row = sqlx::query_as::<_, BranchStock>(
            "SELECT * FROM branch_inventory WHERE product_id = ?1 AND branch_id = ?2",
        )
        .bind(product_id)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn insert_stock(&self, row: &BranchStock) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_stock_row(&mut conn, row).await
    }

    /// Writes an already validated branch quantity.
    pub async fn set_stock_quantity(&self, stock_id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %stock_id, quantity, "Setting branch stock");

        let result =
            sqlx::query("UPDATE branch_inventory SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(stock_id)
                .bind(quantity)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch inventory", stock_id));
        }
        Ok(())
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    pub async fn totals(&self, branch_id: Option<&str>) -> DbResult<InventoryTotals> {
        let pool = &self.pool;
        match branch_id {
            None => {
                let all = Filter::new();
                Ok(InventoryTotals {
                    item_count: aggregate::count_where(pool, "products", &all).await?,
                    total_quantity: aggregate::sum_where(pool, "products", "quantity", &all).await?
                        as i64,
                    total_purchase_value: aggregate::sum_money_where(
                        pool,
                        "products",
                        "purchase_price * quantity",
                        &all,
                    )
                    .await?,
                    total_selling_value: aggregate::sum_money_where(
                        pool,
                        "products",
                        "selling_price * quantity",
                        &all,
                    )
                    .await?,
                    by_category: to_counts(
                        aggregate::group_sum_where(pool, "products", "category", "quantity", &all)
                            .await?,
                    ),
                })
            }
            Some(branch_id) => {
                const JOINED: &str =
                    "branch_inventory bi JOIN products p ON p.id = bi.product_id";
                let at = Filter::new().eq("bi.branch_id", branch_id);
                Ok(InventoryTotals {
                    item_count: aggregate::count_where(pool, JOINED, &at).await?,
                    total_quantity: aggregate::sum_where(pool, JOINED, "bi.quantity", &at).await?
                        as i64,
                    total_purchase_value: aggregate::sum_money_where(
                        pool,
                        JOINED,
                        "p.purchase_price * bi.quantity",
                        &at,
                    )
                    .await?,
                    total_selling_value: aggregate::sum_money_where(
                        pool,
                        JOINED,
                        "p.selling_price * bi.quantity",
                        &at,
                    )
                    .await?,
                    by_category: to_counts(
                        aggregate::group_sum_where(pool, JOINED, "p.category", "bi.quantity", &at)
                            .await?,
                    ),
                })
            }
        }
    }

    /// Stock rows at or below their minimum.
    pub async fn low_stock(&self, branch_id: Option<&str>) -> DbResult<Vec<LowStockItem>> {
        let rows = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT
                bi.product_id, p.sku, p.name, bi.branch_id,
                bi.quantity, bi.minimum_stock, bi.location
            FROM branch_inventory bi
            JOIN products p ON p.id = bi.product_id
            WHERE bi.quantity <= bi.minimum_stock
              AND (?1 IS NULL OR bi.branch_id = ?1)
            ORDER BY bi.quantity ASC, p.name ASC
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn low_stock_count(&self, branch_id: Option<&str>) -> DbResult<i64> {
        let filter = Filter::new()
            .raw("quantity <= minimum_stock", vec![])
            .eq_opt("branch_id", branch_id);
        aggregate::count_where(&self.pool, "branch_inventory", &filter).await
    }
}

fn to_counts(sums: BTreeMap<String, f64>) -> BTreeMap<String, i64> {
    sums.into_iter().map(|(k, v)| (k, v as i64)).collect()
}

async fn insert_stock_row(conn: &mut sqlx::SqliteConnection, row: &BranchStock) -> DbResult<()> {
    debug!(product_id = %row.product_id, branch_id = %row.branch_id, "Inserting branch stock");

    sqlx::query(
        r#"
        INSERT INTO branch_inventory (
            id, product_id, branch_id, quantity, minimum_stock, location, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&row.id)
    .bind(&row.product_id)
    .bind(&row.branch_id)
    .bind(row.quantity)
    .bind(row.minimum_stock)
    .bind(&row.location)
    .bind(row.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::{new_id, testing};
    use zarmind_core::{ListParams, ProductCategory, DEFAULT_MINIMUM_STOCK};

    pub(crate) fn product(sku: &str, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: new_id(),
            sku: sku.to_string(),
            qr_code: format!("QR-{sku}"),
            name: format!("Ring {sku}"),
            description: None,
            category: ProductCategory::ManufacturedProduct,
            status: ProductStatus::InStock,
            weight: Some(4.2),
            gold_purity: Some("18K".to_string()),
            coin_type: None,
            currency_code: None,
            purchase_price: Money::from_major(100.0),
            selling_price: Money::from_major(150.0),
            quantity,
            workshop_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn stock(product_id: &str, branch_id: &str, quantity: i64) -> BranchStock {
        BranchStock {
            id: new_id(),
            product_id: product_id.to_string(),
            branch_id: branch_id.to_string(),
            quantity,
            minimum_stock: DEFAULT_MINIMUM_STOCK,
            location: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_with_stock_and_lookup_by_qr() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let repo = db.products();

        let p = product("PROD-1", 3);
        repo.insert(&p, &[stock(&p.id, &branch.id, 3)]).await.unwrap();

        let found = repo.get_by_qr("QR-PROD-1").await.unwrap().unwrap();
        assert_eq!(found.id, p.id);
        let rows = repo.stock(&p.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_low());
    }

    #[tokio::test]
    async fn test_failed_stock_row_rolls_back_item() {
        let db = testing::database().await;
        let repo = db.products();

        let p = product("PROD-1", 3);
        let err = repo
            .insert(&p, &[stock(&p.id, "no-such-branch", 3)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(repo.get_by_id(&p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_branch_and_quantity_range() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let repo = db.products();

        let a = product("PROD-A", 2);
        repo.insert(&a, &[stock(&a.id, &branch.id, 2)]).await.unwrap();
        let b = product("PROD-B", 20);
        repo.insert(&b, &[]).await.unwrap();

        let q = ProductQuery {
            branch_id: Some(branch.id.clone()),
            ..ProductQuery::default()
        };
        let page = repo.list(&q).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].sku, "PROD-A");

        let q = ProductQuery {
            list: ListParams::default().with_sort("quantity", SortOrder::Asc),
            min_quantity: Some("2".to_string()),
            max_quantity: Some("20".to_string()),
            ..ProductQuery::default()
        };
        let page = repo.list(&q).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].sku, "PROD-A");
    }

    #[tokio::test]
    async fn test_totals_and_low_stock() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let repo = db.products();

        let a = product("PROD-A", 2);
        repo.insert(&a, &[stock(&a.id, &branch.id, 2)]).await.unwrap();
        let b = product("PROD-B", 20);
        repo.insert(&b, &[stock(&b.id, &branch.id, 20)]).await.unwrap();

        let totals = repo.totals(None).await.unwrap();
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 22);
        assert_eq!(totals.total_purchase_value, Money::from_major(2200.0));
        assert_eq!(totals.total_selling_value, Money::from_major(3300.0));
        assert_eq!(totals.by_category.get("MANUFACTURED_PRODUCT"), Some(&22));

        let at_branch = repo.totals(Some(&branch.id)).await.unwrap();
        assert_eq!(at_branch.total_quantity, 22);

        let low = repo.low_stock(Some(&branch.id)).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku, "PROD-A");
        assert_eq!(repo.low_stock_count(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_stock_rows() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let repo = db.products();

        let p = product("PROD-1", 1);
        repo.insert(&p, &[stock(&p.id, &branch.id, 1)]).await.unwrap();
        assert_eq!(repo.dependents(&p.id).await.unwrap(), 0);

        repo.delete(&p.id).await.unwrap();
        assert!(repo.stock(&p.id).await.unwrap().is_empty());
        assert_eq!(db.branches().dependents(&branch.id).await.unwrap(), 0);
    }
}

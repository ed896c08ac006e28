//! Inventory items and per-branch stock.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::{
    clean, insert_with_code, merge, merge_opt, not_found, out_of_range, require_reference,
};
use crate::error::{ApiError, ApiResult};
use zarmind_core::codes::generate_code;
use zarmind_core::status::apply_quantity_delta;
use zarmind_core::validation::{validate_name, validate_non_negative};
use zarmind_core::{
    BranchStock, LowStockItem, Money, NewProduct, PagedResult, Product, ProductPatch,
    ProductQuery, ProductStatus, QuantityAdjustment, DEFAULT_MINIMUM_STOCK,
};
use zarmind_db::{new_id, Database, InventoryTotals, Removal};

/// An item with its branch rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub inventory: Vec<BranchStock>,
    pub total_branch_quantity: i64,
}

/// `POST :id/adjust`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentResult {
    pub success: bool,
    pub message: String,
    pub new_quantity: i64,
    pub notes: Option<String>,
}

/// `GET summary`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub item_count: i64,
    pub total_quantity: i64,
    #[serde(with = "zarmind_core::money::major")]
    pub total_purchase_value: Money,
    #[serde(with = "zarmind_core::money::major")]
    pub total_selling_value: Money,
    pub by_category: BTreeMap<String, i64>,
    pub low_stock: Vec<LowStockItem>,
}

impl InventorySummary {
    fn new(totals: InventoryTotals, low_stock: Vec<LowStockItem>) -> Self {
        InventorySummary {
            item_count: totals.item_count,
            total_quantity: totals.total_quantity,
            total_purchase_value: totals.total_purchase_value,
            total_selling_value: totals.total_selling_value,
            by_category: totals.by_category,
            low_stock,
        }
    }
}

/// Branch-row write decided before anything is persisted.
enum StockWrite {
    Set { stock_id: String, quantity: i64 },
    Create(BranchStock),
    Skip,
}

pub struct ProductService {
    db: Database,
}

impl ProductService {
    pub fn new(db: &Database) -> Self {
        ProductService { db: db.clone() }
    }

    /// Creates the item and its initial branch rows in one transaction.
    pub async fn create(&self, input: NewProduct) -> ApiResult<ProductDetail> {
        validate_name("name", &input.name)?;
        let purchase_price = input.purchase_price.unwrap_or_default();
        let selling_price = input.selling_price.unwrap_or_default();
        validate_non_negative("purchasePrice", purchase_price)?;
        validate_non_negative("sellingPrice", selling_price)?;

        let workshop_id = clean(input.workshop_id);
        if let Some(workshop_id) = workshop_id.as_deref() {
            require_reference(self.db.workshops().exists(workshop_id).await?, "Workshop")?;
        }

        let now = Utc::now();
        let product_id = new_id();
        let mut stock = Vec::new();
        for allocation in input.allocations.into_iter().filter(|a| a.quantity > 0) {
            require_reference(
                self.db.branches().exists(&allocation.branch_id).await?,
                "Branch",
            )?;
            stock.push(BranchStock {
                id: new_id(),
                product_id: product_id.clone(),
                branch_id: allocation.branch_id,
                quantity: allocation.quantity,
                minimum_stock: allocation.minimum_stock.unwrap_or(DEFAULT_MINIMUM_STOCK),
                location: clean(allocation.location),
                updated_at: now,
            });
        }

        let quantity = match input.quantity {
            Some(quantity) => quantity,
            None => stock
                .iter()
                .try_fold(0_i64, |total, s| total.checked_add(s.quantity))
                .ok_or_else(|| out_of_range("quantity"))?,
        };
        if quantity < 0 {
            return Err(ApiError::validation("quantity must not be negative"));
        }

        let category = input.category.unwrap_or_default();
        let qr_code = clean(input.qr_code);
        let template = Product {
            id: product_id,
            qr_code: String::new(),
            sku: String::new(),
            name: input.name.trim().to_string(),
            description: clean(input.description),
            category,
            status: input.status.unwrap_or_default(),
            weight: input.weight,
            gold_purity: clean(input.gold_purity),
            coin_type: clean(input.coin_type),
            currency_code: clean(input.currency_code),
            purchase_price,
            selling_price,
            quantity,
            workshop_id,
            created_at: now,
            updated_at: now,
        };

        let repo = &self.db.products();
        let rows = &stock;
        let product = insert_with_code(
            "sku",
            input.sku,
            || generate_code(category.sku_prefix()),
            move |sku| {
                let product = Product {
                    qr_code: qr_code.clone().unwrap_or_else(|| format!("QR-{sku}")),
                    sku,
                    ..template.clone()
                };
                async move { repo.insert(&product, rows).await }
            },
        )
        .await?;
        info!(id = %product.id, sku = %product.sku, branches = stock.len(), "Product created");
        Ok(detail(product, stock))
    }

    pub async fn list(&self, query: &ProductQuery) -> ApiResult<PagedResult<Product>> {
        Ok(self.db.products().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<ProductDetail> {
        let repo = self.db.products();
        let product = repo.get(id).await?;
        let stock = repo.stock(id).await?;
        Ok(detail(product, stock))
    }

    pub async fn by_qr(&self, qr_code: &str) -> ApiResult<ProductDetail> {
        let repo = self.db.products();
        let product = repo
            .get_by_qr(qr_code)
            .await?
            .ok_or_else(|| not_found("Product"))?;
        let stock = repo.stock(&product.id).await?;
        Ok(detail(product, stock))
    }

    pub async fn update(&self, id: &str, patch: ProductPatch) -> ApiResult<Product> {
        let repo = self.db.products();
        let mut product = repo.get(id).await?;

        if let Some(name) = patch.name.as_deref() {
            validate_name("name", name)?;
        }
        if let Some(price) = patch.purchase_price {
            validate_non_negative("purchasePrice", price)?;
        }
        if let Some(price) = patch.selling_price {
            validate_non_negative("sellingPrice", price)?;
        }
        if let Some(workshop_id) = patch.workshop_id.as_deref() {
            require_reference(self.db.workshops().exists(workshop_id).await?, "Workshop")?;
        }

        merge(&mut product.name, patch.name.map(|n| n.trim().to_string()));
        merge_opt(&mut product.description, patch.description);
        merge(&mut product.status, patch.status);
        merge_opt(&mut product.weight, patch.weight);
        merge_opt(&mut product.gold_purity, patch.gold_purity);
        merge_opt(&mut product.coin_type, patch.coin_type);
        merge_opt(&mut product.currency_code, patch.currency_code);
        merge(&mut product.purchase_price, patch.purchase_price);
        merge(&mut product.selling_price, patch.selling_price);
        merge_opt(&mut product.workshop_id, patch.workshop_id);

        product.updated_at = Utc::now();
        repo.update(&product).await?;
        Ok(product)
    }

    /// Applies a signed stock correction.
    ///
    /// Both the item counter and the branch row are checked before either
    /// is written. Not locked: concurrent adjustments can lose an update.
    pub async fn adjust(&self, id: &str, input: QuantityAdjustment) -> ApiResult<AdjustmentResult> {
        let repo = self.db.products();
        let product = repo.get(id).await?;
        let delta = input.adjustment;
        let new_quantity = apply_quantity_delta(product.quantity, delta)?;

        let stock_write = match clean(input.branch_id) {
            None => StockWrite::Skip,
            Some(branch_id) => {
                require_reference(self.db.branches().exists(&branch_id).await?, "Branch")?;
                match repo.stock_at(id, &branch_id).await? {
                    Some(row) => {
                        let quantity = row
                            .quantity
                            .checked_add(delta)
                            .ok_or_else(|| out_of_range("quantity"))?;
                        if quantity < 0 {
                            return Err(ApiError::bad_request(
                                "Adjustment would result in negative branch inventory",
                            ));
                        }
                        StockWrite::Set {
                            stock_id: row.id,
                            quantity,
                        }
                    }
                    None if delta > 0 => StockWrite::Create(BranchStock {
                        id: new_id(),
                        product_id: id.to_string(),
                        branch_id,
                        quantity: delta,
                        minimum_stock: DEFAULT_MINIMUM_STOCK,
                        location: None,
                        updated_at: Utc::now(),
                    }),
                    None => StockWrite::Skip,
                }
            }
        };

        repo.set_quantity(id, new_quantity).await?;
        match stock_write {
            StockWrite::Set { stock_id, quantity } => {
                repo.set_stock_quantity(&stock_id, quantity).await?
            }
            StockWrite::Create(row) => repo.insert_stock(&row).await?,
            StockWrite::Skip => {}
        }

        info!(id = %id, delta, new_quantity, "Product quantity adjusted");
        Ok(AdjustmentResult {
            success: true,
            message: format!("Quantity adjusted by {delta}"),
            new_quantity,
            notes: clean(input.notes),
        })
    }

    pub async fn summary(&self, branch_id: Option<&str>) -> ApiResult<InventorySummary> {
        let repo = self.db.products();
        let totals = repo.totals(branch_id).await?;
        let low_stock = repo.low_stock(branch_id).await?;
        Ok(InventorySummary::new(totals, low_stock))
    }

    /// Items referenced by purchases are marked RETURNED instead of deleted.
    pub async fn remove(&self, id: &str) -> ApiResult<Removal> {
        let repo = self.db.products();
        repo.get(id).await?;

        let removal = Removal::for_dependents(repo.dependents(id).await?);
        match removal {
            Removal::Deactivated => repo.set_status(id, ProductStatus::Returned).await?,
            Removal::Deleted => repo.delete(id).await?,
        }
        info!(id = %id, ?removal, "Product removed");
        Ok(removal)
    }
}

fn detail(product: Product, inventory: Vec<BranchStock>) -> ProductDetail {
    ProductDetail {
        total_branch_quantity: inventory
            .iter()
            .fold(0, |total, s| total.saturating_add(s.quantity)),
        product,
        inventory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing;
    use zarmind_core::{BranchAllocation, ListParams, ProductCategory};

    fn ring(sku: &str) -> NewProduct {
        NewProduct {
            sku: Some(sku.to_string()),
            name: "Gold ring".to_string(),
            category: Some(ProductCategory::ManufacturedProduct),
            gold_purity: Some("18K".to_string()),
            purchase_price: Some(Money::from_major(120.0)),
            selling_price: Some(Money::from_major(150.0)),
            ..NewProduct::default()
        }
    }

    fn allocate(branch_id: &str, quantity: i64) -> BranchAllocation {
        BranchAllocation {
            branch_id: branch_id.to_string(),
            quantity,
            ..BranchAllocation::default()
        }
    }

    #[tokio::test]
    async fn test_create_generates_codes_and_allocates() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let service = ProductService::new(&db);

        let created = service
            .create(NewProduct {
                sku: None,
                allocations: vec![allocate(&branch.id, 4), allocate(&branch.id, 0)],
                ..ring("unused")
            })
            .await
            .unwrap();
        assert!(created.product.sku.starts_with("PROD-"));
        assert_eq!(created.product.qr_code, format!("QR-{}", created.product.sku));
        assert_eq!(created.product.quantity, 4);
        assert_eq!(created.inventory.len(), 1);
        assert_eq!(created.inventory[0].minimum_stock, DEFAULT_MINIMUM_STOCK);

        let by_qr = service.by_qr(&created.product.qr_code).await.unwrap();
        assert_eq!(by_qr.total_branch_quantity, 4);
    }

    #[tokio::test]
    async fn test_unknown_branch_allocation_is_rejected() {
        let db = testing::database().await;
        let err = ProductService::new(&db)
            .create(NewProduct {
                allocations: vec![allocate("missing", 2)],
                ..ring("RING-1")
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "Branch not found");
    }

    #[tokio::test]
    async fn test_negative_adjustment_leaves_quantity() {
        let db = testing::database().await;
        let service = ProductService::new(&db);
        let created = service
            .create(NewProduct {
                quantity: Some(3),
                ..ring("RING-2")
            })
            .await
            .unwrap();

        let err = service
            .adjust(
                &created.product.id,
                QuantityAdjustment {
                    adjustment: -5,
                    ..QuantityAdjustment::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert_eq!(err.message, "Adjustment would result in negative quantity");
        assert_eq!(service.get(&created.product.id).await.unwrap().product.quantity, 3);
    }

    #[tokio::test]
    async fn test_branch_adjustment_checked_before_write() {
        let db = testing::database().await;
        let tajrish = testing::branch(&db, "Tajrish").await;
        let vanak = testing::branch(&db, "Vanak").await;
        let service = ProductService::new(&db);
        let created = service
            .create(NewProduct {
                quantity: Some(10),
                allocations: vec![allocate(&tajrish.id, 2)],
                ..ring("RING-3")
            })
            .await
            .unwrap();
        let id = created.product.id.clone();

        let err = service
            .adjust(
                &id,
                QuantityAdjustment {
                    adjustment: -3,
                    branch_id: Some(tajrish.id.clone()),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.message.contains("negative branch inventory"));
        assert_eq!(service.get(&id).await.unwrap().product.quantity, 10);

        let result = service
            .adjust(
                &id,
                QuantityAdjustment {
                    adjustment: 5,
                    branch_id: Some(vanak.id.clone()),
                    notes: Some("Transfer in".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(result.new_quantity, 15);
        assert_eq!(result.message, "Quantity adjusted by 5");

        let detail = service.get(&id).await.unwrap();
        assert_eq!(detail.inventory.len(), 2);
        assert_eq!(detail.total_branch_quantity, 7);
    }

    #[tokio::test]
    async fn test_quantity_overflow_is_rejected() {
        let db = testing::database().await;
        let tajrish = testing::branch(&db, "Tajrish").await;
        let vanak = testing::branch(&db, "Vanak").await;
        let service = ProductService::new(&db);

        let err = service
            .create(NewProduct {
                allocations: vec![allocate(&tajrish.id, i64::MAX), allocate(&vanak.id, 1)],
                ..ring("RING-7")
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "quantity is out of range");

        let created = service
            .create(NewProduct {
                quantity: Some(1),
                allocations: vec![allocate(&tajrish.id, i64::MAX)],
                ..ring("RING-8")
            })
            .await
            .unwrap();
        let id = created.product.id.clone();

        let err = service
            .adjust(
                &id,
                QuantityAdjustment {
                    adjustment: 1,
                    branch_id: Some(tajrish.id.clone()),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "quantity is out of range");
        let after = service.get(&id).await.unwrap();
        assert_eq!(after.product.quantity, 1);
        assert_eq!(after.inventory[0].quantity, i64::MAX);
    }

    #[tokio::test]
    async fn test_summary_reports_low_stock() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let service = ProductService::new(&db);
        service
            .create(NewProduct {
                quantity: Some(3),
                allocations: vec![allocate(&branch.id, 3)],
                ..ring("RING-4")
            })
            .await
            .unwrap();
        service
            .create(NewProduct {
                quantity: Some(50),
                allocations: vec![BranchAllocation {
                    minimum_stock: Some(5),
                    ..allocate(&branch.id, 50)
                }],
                ..ring("RING-5")
            })
            .await
            .unwrap();

        let summary = service.summary(Some(&branch.id)).await.unwrap();
        assert_eq!(summary.low_stock.len(), 1);
        assert_eq!(summary.low_stock[0].sku, "RING-4");

        let page = service
            .list(&ProductQuery {
                list: ListParams::default(),
                min_quantity: Some("10".to_string()),
                ..ProductQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_remove_without_dependents_deletes() {
        let db = testing::database().await;
        let branch = testing::branch(&db, "Tajrish").await;
        let service = ProductService::new(&db);
        let created = service
            .create(NewProduct {
                allocations: vec![allocate(&branch.id, 1)],
                ..ring("RING-6")
            })
            .await
            .unwrap();

        assert_eq!(service.remove(&created.product.id).await.unwrap(), Removal::Deleted);
        assert_eq!(
            service.get(&created.product.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}

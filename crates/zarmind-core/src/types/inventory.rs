//! Inventory items and their per-branch stock rows.
//!
//! ```text
//! Product (sku, qrCode, quantity = total on hand)
//!    │ 1..n
//!    ▼
//! BranchStock (branchId, quantity, minimumStock, location)
//! ```
//!
//! `Product.quantity` is the item-level counter moved by adjustments and
//! purchase receipts; the per-branch breakdown is summed for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ProductCategory, ProductStatus};
use crate::money::Money;
use crate::paging::ListParams;

// =============================================================================
// Product
// =============================================================================

/// A stock item: raw gold, a finished piece, a stone, a coin, cash in a
/// foreign currency or general goods.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    /// Unique, generated from the category prefix when absent.
    pub sku: String,
    /// Unique, defaults to `QR-<sku>`.
    pub qr_code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub status: ProductStatus,
    /// Grams.
    pub weight: Option<f64>,
    /// e.g. `18K`.
    pub gold_purity: Option<String>,
    pub coin_type: Option<String>,
    pub currency_code: Option<String>,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub purchase_price: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub selling_price: Money,
    pub quantity: i64,
    pub workshop_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Stock of one product held at one branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BranchStock {
    pub id: String,
    pub product_id: String,
    pub branch_id: String,
    pub quantity: i64,
    pub minimum_stock: i64,
    pub location: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl BranchStock {
    pub fn is_low(&self) -> bool {
        self.quantity <= self.minimum_stock
    }
}

/// Initial stock placed at a branch when an item is created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchAllocation {
    #[serde(default)]
    pub branch_id: String,
    #[serde(default)]
    pub quantity: i64,
    pub minimum_stock: Option<i64>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: Option<String>,
    pub qr_code: Option<String>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<ProductCategory>,
    pub status: Option<ProductStatus>,
    pub weight: Option<f64>,
    pub gold_purity: Option<String>,
    pub coin_type: Option<String>,
    pub currency_code: Option<String>,
    #[serde(default, with = "crate::money::major::option")]
    pub purchase_price: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub selling_price: Option<Money>,
    pub quantity: Option<i64>,
    pub workshop_id: Option<String>,
    #[serde(default)]
    pub allocations: Vec<BranchAllocation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProductStatus>,
    pub weight: Option<f64>,
    pub gold_purity: Option<String>,
    pub coin_type: Option<String>,
    pub currency_code: Option<String>,
    #[serde(default, with = "crate::money::major::option")]
    pub purchase_price: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub selling_price: Option<Money>,
    pub workshop_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub category: Option<ProductCategory>,
    pub status: Option<ProductStatus>,
    /// Items with a stock row at this branch.
    pub branch_id: Option<String>,
    /// Inclusive bounds on `quantity`, read as numbers.
    pub min_quantity: Option<String>,
    pub max_quantity: Option<String>,
    pub gold_purity: Option<String>,
    pub coin_type: Option<String>,
}

/// Signed stock correction, optionally scoped to one branch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityAdjustment {
    #[serde(default)]
    pub adjustment: i64,
    pub branch_id: Option<String>,
    pub notes: Option<String>,
}

/// A branch stock row at or below its minimum, with the item it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LowStockItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub branch_id: String,
    pub quantity: i64,
    pub minimum_stock: i64,
    pub location: Option<String>,
}

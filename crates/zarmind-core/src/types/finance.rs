//! Ledger records (payables and receivables) and purchase orders.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{LedgerStatus, PurchaseStatus};
use crate::money::Money;
use crate::paging::ListParams;

// =============================================================================
// Ledger
// =============================================================================

/// Which side of the books a ledger record sits on.
///
/// ```text
/// Payable    we owe a supplier   counterparty = suppliers.id
/// Receivable a customer owes us  counterparty = customers.id
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKind {
    Payable,
    Receivable,
}

impl LedgerKind {
    /// Entity name of the counterparty, as used in error messages.
    pub fn counterparty(&self) -> &'static str {
        match self {
            LedgerKind::Payable => "Supplier",
            LedgerKind::Receivable => "Customer",
        }
    }

    /// Entity name of the record itself.
    pub fn entity(&self) -> &'static str {
        match self {
            LedgerKind::Payable => "Accounts payable record",
            LedgerKind::Receivable => "Accounts receivable record",
        }
    }

    /// Prefix for generated invoice numbers.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            LedgerKind::Payable => "AP",
            LedgerKind::Receivable => "AR",
        }
    }
}

/// A payable or receivable invoice.
///
/// `remaining_amount` and `status` are always recomputed server-side from
/// `amount` and `paid_amount`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    /// Supplier id for payables, customer id for receivables.
    pub counterparty_id: String,
    pub invoice_number: String,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub amount: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub paid_amount: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub remaining_amount: Money,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: LedgerStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Days past due as of `as_of`; 0 when not yet due or no due date.
    pub fn days_overdue(&self, as_of: NaiveDate) -> i64 {
        self.due_date
            .map(|due| (as_of - due).num_days().max(0))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLedgerEntry {
    #[serde(default, alias = "supplierId", alias = "customerId")]
    pub counterparty_id: String,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    #[serde(default, with = "crate::money::major")]
    pub amount: Money,
    #[serde(default, with = "crate::money::major::option")]
    pub paid_amount: Option<Money>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery {
    #[serde(flatten)]
    pub list: ListParams,
    #[serde(alias = "supplierId", alias = "customerId")]
    pub counterparty_id: Option<String>,
    pub status: Option<LedgerStatus>,
    /// Inclusive bounds on `invoiceDate`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// `true`/`1`/`yes`: due before today and not fully paid.
    pub overdue: Option<String>,
}

/// Partial update. There is no `status`: it is derived.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPatch {
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    #[serde(default, with = "crate::money::major::option")]
    pub amount: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub paid_amount: Option<Money>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    #[serde(default, alias = "amount", with = "crate::money::major")]
    pub payment_amount: Money,
    pub notes: Option<String>,
}

// =============================================================================
// Purchase
// =============================================================================

/// A purchase order from a supplier into a branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub purchase_number: String,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub supplier_id: Option<String>,
    pub branch_id: String,
    pub user_id: String,
    pub status: PurchaseStatus,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub subtotal: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub tax_amount: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub total_amount: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub paid_amount: Money,
    pub payment_method: Option<String>,
    #[ts(as = "Option<String>")]
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One ordered line of a purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub received_quantity: i64,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub unit_price: Money,
    pub weight: Option<f64>,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub subtotal: Money,
    pub notes: Option<String>,
}

impl PurchaseItem {
    pub fn outstanding(&self) -> i64 {
        (self.quantity - self.received_quantity).max(0)
    }

    pub fn is_fully_received(&self) -> bool {
        self.received_quantity >= self.quantity
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseItem {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, with = "crate::money::major")]
    pub unit_price: Money,
    pub weight: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchase {
    pub purchase_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub branch_id: String,
    pub status: Option<PurchaseStatus>,
    #[serde(default, with = "crate::money::major::option")]
    pub subtotal: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub tax_amount: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub total_amount: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub paid_amount: Option<Money>,
    pub payment_method: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<NewPurchaseItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub status: Option<PurchaseStatus>,
    pub supplier_id: Option<String>,
    pub branch_id: Option<String>,
    /// Inclusive bounds on `purchaseDate`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Header fields only; status and items move through dedicated actions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePatch {
    pub purchase_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    #[serde(default, with = "crate::money::major::option")]
    pub paid_amount: Option<Money>,
    pub notes: Option<String>,
}

/// Signed change to one item's received quantity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveLine {
    #[serde(default)]
    pub item_id: String,
    #[serde(default, alias = "receivedQuantity")]
    pub quantity: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveItems {
    #[serde(default)]
    pub items: Vec<ReceiveLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePurchase {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelPurchase {
    #[serde(default)]
    pub reason: String,
    pub notes: Option<String>,
}

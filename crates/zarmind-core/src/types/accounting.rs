//! Expense categories, expenses and the cash book.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{CashTransactionType, PaymentMethod};
use crate::json::JsonText;
use crate::money::Money;
use crate::paging::ListParams;

// =============================================================================
// Expense Category
// =============================================================================

/// Grouping for expenses, optionally nested under a parent category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseCategory {
    pub id: String,
    /// Display name (Persian).
    pub name: String,
    pub name_en: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpenseCategory {
    #[serde(default)]
    pub name: String,
    pub name_en: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategoryPatch {
    pub name: Option<String>,
    pub name_en: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategoryQuery {
    pub search: Option<String>,
}

// =============================================================================
// Expense
// =============================================================================

/// A business expense. `approved_by`/`approved_at` are only set by the
/// approve action.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub category_id: String,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub amount: Money,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    pub title: String,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub invoice_number: Option<String>,
    #[ts(as = "Vec<String>")]
    pub receipt_images: JsonText<Vec<String>>,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub is_recurring: bool,
    pub recurring_pattern: Option<String>,
    pub approved_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    #[serde(default)]
    pub category_id: String,
    #[serde(default, with = "crate::money::major")]
    pub amount: Money,
    pub expense_date: Option<NaiveDate>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub receipt_images: Vec<String>,
    pub payment_method: Option<PaymentMethod>,
    pub reference_number: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurring_pattern: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub category_id: Option<String>,
    /// Substring match.
    pub vendor: Option<String>,
    pub is_recurring: Option<String>,
    /// Inclusive bounds on `expenseDate`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Inclusive bounds on `amount`, in major units.
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePatch {
    pub category_id: Option<String>,
    #[serde(default, with = "crate::money::major::option")]
    pub amount: Option<Money>,
    pub expense_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub invoice_number: Option<String>,
    pub receipt_images: Option<Vec<String>>,
    pub payment_method: Option<PaymentMethod>,
    pub reference_number: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurring_pattern: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Cash Transaction
// =============================================================================

/// One movement in a branch cash book.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashTransaction {
    pub id: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub kind: CashTransactionType,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub amount: Money,
    #[ts(as = "String")]
    pub transaction_date: DateTime<Utc>,
    pub branch_id: String,
    /// The user who recorded the movement.
    pub user_id: String,
    pub category: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCashTransaction {
    #[serde(default, rename = "type")]
    pub kind: CashTransactionType,
    #[serde(default, with = "crate::money::major")]
    pub amount: Money,
    pub transaction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub branch_id: String,
    pub category: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashTransactionQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub branch_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CashTransactionType>,
    pub category: Option<String>,
    pub user_id: Option<String>,
    /// Inclusive bounds on the calendar day of `transactionDate`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
}

/// The recording user and branch are fixed once written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashTransactionPatch {
    #[serde(rename = "type")]
    pub kind: Option<CashTransactionType>,
    #[serde(default, with = "crate::money::major::option")]
    pub amount: Option<Money>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
}

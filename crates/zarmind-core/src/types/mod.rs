//! # Domain Types
//!
//! Entities, create payloads, partial-update patches and status enums for
//! every resource the ERP manages.
//!
//! ## Type Families
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  party        Branch, Customer, Supplier, Employee, Workshop, User     │
//! │  inventory    Product, BranchStock                                     │
//! │  finance      LedgerEntry (AP/AR), Purchase, PurchaseItem              │
//! │  accounting   ExpenseCategory, Expense, CashTransaction                │
//! │  payroll      Payroll                                                  │
//! │  work_order   WorkOrder                                                │
//! │  setting      Setting                                                  │
//! │                                                                         │
//! │  Per resource:                                                          │
//! │    Entity      row as stored, serialized as the API response           │
//! │    NewEntity   create payload (server fills id, code, timestamps)      │
//! │    EntityPatch partial update (None = leave unchanged)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business code (`code`, `sku`, `purchaseNumber`, ...) - printed on paper
//!
//! All enums serialize as `SCREAMING_SNAKE_CASE` on the wire and in SQLite.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

mod accounting;
mod finance;
mod inventory;
mod party;
mod payroll;
mod setting;
mod work_order;

pub use accounting::*;
pub use finance::*;
pub use inventory::*;
pub use party::*;
pub use payroll::*;
pub use setting::*;
pub use work_order::*;

// =============================================================================
// Enum Macro
// =============================================================================

/// Declares a wire/database enum with `as_str`, `Display`, `FromStr`
/// (case-insensitive) and `Default`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident($field:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
        default = $default:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[ts(export)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_uppercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $name::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    })
            }
        }
    };
}

// =============================================================================
// Users & Roles
// =============================================================================

string_enum! {
    /// Role carried in the access token and checked by route guards.
    pub enum UserRole("role") {
        SuperAdmin => "SUPER_ADMIN",
        Admin => "ADMIN",
        Manager => "MANAGER",
        SalesStaff => "SALES_STAFF",
        Accountant => "ACCOUNTANT",
        WarehouseStaff => "WAREHOUSE_STAFF",
        Viewer => "VIEWER",
    }
    default = Viewer;
}

string_enum! {
    pub enum UserStatus("status") {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Suspended => "SUSPENDED",
    }
    default = Active;
}

// =============================================================================
// CRM & Partners
// =============================================================================

string_enum! {
    pub enum CustomerType("type") {
        Individual => "INDIVIDUAL",
        Business => "BUSINESS",
    }
    default = Individual;
}

string_enum! {
    pub enum CustomerStatus("status") {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Blacklisted => "BLACKLISTED",
    }
    default = Active;
}

string_enum! {
    pub enum SupplierStatus("status") {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Blacklisted => "BLACKLISTED",
    }
    default = Active;
}

string_enum! {
    pub enum WorkshopStatus("status") {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Suspended => "SUSPENDED",
    }
    default = Active;
}

// =============================================================================
// HR
// =============================================================================

string_enum! {
    /// `Terminated` and `Resigned` are terminal: the employee drops out of
    /// active rosters but the record stays editable by administrators.
    pub enum EmploymentStatus("status") {
        Active => "ACTIVE",
        OnLeave => "ON_LEAVE",
        Suspended => "SUSPENDED",
        Terminated => "TERMINATED",
        Resigned => "RESIGNED",
    }
    default = Active;
}

impl EmploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EmploymentStatus::Terminated | EmploymentStatus::Resigned)
    }
}

string_enum! {
    pub enum EmploymentType("employmentType") {
        FullTime => "FULL_TIME",
        PartTime => "PART_TIME",
        Contract => "CONTRACT",
        Temporary => "TEMPORARY",
    }
    default = FullTime;
}

// =============================================================================
// Inventory
// =============================================================================

string_enum! {
    pub enum ProductCategory("category") {
        RawGold => "RAW_GOLD",
        ManufacturedProduct => "MANUFACTURED_PRODUCT",
        Stone => "STONE",
        Coin => "COIN",
        Currency => "CURRENCY",
        GeneralGoods => "GENERAL_GOODS",
    }
    default = ManufacturedProduct;
}

impl ProductCategory {
    /// Prefix used when a SKU has to be generated.
    pub fn sku_prefix(&self) -> &'static str {
        match self {
            ProductCategory::RawGold => "RG",
            ProductCategory::ManufacturedProduct => "PROD",
            ProductCategory::Stone => "STONE",
            ProductCategory::Coin => "COIN",
            ProductCategory::Currency => "CURR",
            ProductCategory::GeneralGoods => "GG",
        }
    }
}

string_enum! {
    pub enum ProductStatus("status") {
        InStock => "IN_STOCK",
        Sold => "SOLD",
        Reserved => "RESERVED",
        InWorkshop => "IN_WORKSHOP",
        Returned => "RETURNED",
        Damaged => "DAMAGED",
    }
    default = InStock;
}

// =============================================================================
// Finance
// =============================================================================

string_enum! {
    /// Payment state of a payable or receivable. Always derived, never
    /// taken from client input (see [`crate::status::LedgerStatus::derive`]).
    pub enum LedgerStatus("status") {
        Pending => "PENDING",
        Partial => "PARTIAL",
        Paid => "PAID",
    }
    default = Pending;
}

string_enum! {
    pub enum PurchaseStatus("status") {
        Pending => "PENDING",
        PartiallyReceived => "PARTIALLY_RECEIVED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
    default = Pending;
}

string_enum! {
    pub enum PaymentMethod("paymentMethod") {
        Cash => "CASH",
        Check => "CHECK",
        BankTransfer => "BANK_TRANSFER",
        Card => "CARD",
        Installment => "INSTALLMENT",
        TradeIn => "TRADE_IN",
        Mixed => "MIXED",
    }
    default = Cash;
}

string_enum! {
    /// Only `CashIn` and `CashOut` move the running balance.
    pub enum CashTransactionType("type") {
        CashIn => "CASH_IN",
        CashOut => "CASH_OUT",
        OpeningBalance => "OPENING_BALANCE",
        ClosingBalance => "CLOSING_BALANCE",
        PettyCash => "PETTY_CASH",
    }
    default = CashIn;
}

// =============================================================================
// Work Orders
// =============================================================================

string_enum! {
    pub enum WorkOrderStatus("status") {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        InProgress => "IN_PROGRESS",
        QualityCheck => "QUALITY_CHECK",
        Completed => "COMPLETED",
        Delivered => "DELIVERED",
        Cancelled => "CANCELLED",
        Rejected => "REJECTED",
    }
    default = Pending;
}

string_enum! {
    pub enum WorkOrderPriority("priority") {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Urgent => "URGENT",
    }
    default = Medium;
}

// =============================================================================
// Settings
// =============================================================================

string_enum! {
    pub enum SettingCategory("category") {
        General => "GENERAL",
        Company => "COMPANY",
        Tax => "TAX",
        Currency => "CURRENCY",
        Email => "EMAIL",
        Notification => "NOTIFICATION",
        Security => "SECURITY",
        Integration => "INTEGRATION",
        Printer => "PRINTER",
        Backup => "BACKUP",
    }
    default = General;
}

string_enum! {
    pub enum SettingValueType("valueType") {
        String => "STRING",
        Number => "NUMBER",
        Boolean => "BOOLEAN",
        Json => "JSON",
    }
    default = String;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&EmploymentStatus::OnLeave).unwrap(),
            "\"ON_LEAVE\""
        );
        assert_eq!(
            serde_json::from_str::<UserRole>("\"SUPER_ADMIN\"").unwrap(),
            UserRole::SuperAdmin
        );
        assert_eq!(PurchaseStatus::PartiallyReceived.as_str(), "PARTIALLY_RECEIVED");
        assert_eq!(
            serde_json::from_str::<CashTransactionType>("\"PETTY_CASH\"").unwrap(),
            CashTransactionType::PettyCash
        );
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("paid".parse::<LedgerStatus>().unwrap(), LedgerStatus::Paid);
        assert_eq!(
            " in_stock ".parse::<ProductStatus>().unwrap(),
            ProductStatus::InStock
        );
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "LOST".parse::<ProductStatus>().unwrap_err();
        match err {
            ValidationError::NotAllowed { field, allowed } => {
                assert_eq!(field, "status");
                assert!(allowed.contains(&"SOLD".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(LedgerStatus::default(), LedgerStatus::Pending);
        assert_eq!(UserRole::default(), UserRole::Viewer);
        assert!(EmploymentStatus::Terminated.is_terminal());
        assert!(!EmploymentStatus::OnLeave.is_terminal());
        assert_eq!(WorkOrderPriority::default(), WorkOrderPriority::Medium);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }
}

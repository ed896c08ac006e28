//! # Repository Module
//!
//! One repository per resource. Every repository follows the same shape:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  XRepository { pool }                                                  │
//! │  ├── list(&XQuery)        → PagedResult<X>   (query::paginate)          │
//! │  ├── get_by_id(id)        → Option<X>                                  │
//! │  ├── get(id)              → X, or DbError::NotFound                    │
//! │  ├── insert(&X)           → X                                          │
//! │  ├── update(&X)           → ()  (full row, caller merged the patch)    │
//! │  ├── set_status(id, ..)   → ()  (soft delete)                          │
//! │  ├── delete(id)           → ()  (hard delete)                          │
//! │  └── dependents(id)       → i64 (decides soft vs hard delete)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories only move rows. Business rules (derived status, negative
//! stock, over-payment) are decided by the caller before anything here is
//! called.
//!
//! ## Available Repositories
//!
//! - [`BranchRepository`](branch::BranchRepository)
//! - [`CustomerRepository`](customer::CustomerRepository)
//! - [`SupplierRepository`](supplier::SupplierRepository)
//! - [`WorkshopRepository`](workshop::WorkshopRepository)
//! - [`EmployeeRepository`](employee::EmployeeRepository)
//! - [`UserRepository`](user::UserRepository)
//! - [`ProductRepository`](product::ProductRepository) - items and branch stock
//! - [`LedgerRepository`](ledger::LedgerRepository) - payables and receivables
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - orders and lines
//! - [`SettingRepository`](setting::SettingRepository)
//! - [`ExpenseRepository`](expense::ExpenseRepository) - categories and expenses
//! - [`CashRepository`](cash::CashRepository) - branch cash book
//! - [`PayrollRepository`](payroll::PayrollRepository)
//! - [`WorkOrderRepository`](work_order::WorkOrderRepository)

use uuid::Uuid;

pub mod branch;
pub mod cash;
pub mod customer;
pub mod employee;
pub mod expense;
pub mod ledger;
pub mod payroll;
pub mod product;
pub mod purchase;
pub mod setting;
pub mod supplier;
pub mod user;
pub mod work_order;
pub mod workshop;

/// Generates a new row id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// How a `remove` request was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The row is gone.
    Deleted,
    /// Dependents exist; the row was flipped to an inactive/terminal state.
    Deactivated,
}

impl Removal {
    /// Picks the removal mode from a dependent count.
    pub fn for_dependents(count: i64) -> Removal {
        if count > 0 {
            Removal::Deactivated
        } else {
            Removal::Deleted
        }
    }
}

/// Appends `addition` to existing notes on a new line.
///
/// ```rust
/// use zarmind_db::repository::append_note;
///
/// assert_eq!(append_note(None, "paid cash"), "paid cash");
/// assert_eq!(append_note(Some("first"), "second"), "first\nsecond");
/// ```
pub fn append_note(existing: Option<&str>, addition: &str) -> String {
    match existing.map(str::trim_end).filter(|s| !s.is_empty()) {
        Some(existing) => format!("{existing}\n{addition}"),
        None => addition.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by repository tests.

    use chrono::Utc;

    use super::new_id;
    use crate::{Database, DbConfig};
    use zarmind_core::Branch;

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn branch(code: &str) -> Branch {
        let now = Utc::now();
        Branch {
            id: new_id(),
            code: code.to_string(),
            name: format!("Branch {code}"),
            city: Some("Tehran".to_string()),
            address: None,
            phone: None,
            is_main_branch: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removal_for_dependents() {
        assert_eq!(Removal::for_dependents(0), Removal::Deleted);
        assert_eq!(Removal::for_dependents(3), Removal::Deactivated);
    }

    #[test]
    fn test_append_note_skips_blank_existing() {
        assert_eq!(append_note(Some("  "), "x"), "x");
    }
}

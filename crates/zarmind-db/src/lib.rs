//! # zarmind-db: Database Layer for Zarmind ERP
//!
//! Every SQL statement in the workspace lives in this crate. It uses SQLite
//! through sqlx, with runtime-checked queries and embedded migrations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Zarmind Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (GET /api/crm/customers?search=ali&page=2)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Service (apps/api) ── validation, references, derived status          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   zarmind-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐   ┌──────────────┐   ┌────────────────────┐  │   │
//! │  │   │  Database   │   │ Repositories │   │   query engine     │  │   │
//! │  │   │  (pool.rs)  │◄──│ customer.rs  │──►│ Filter + Resource  │  │   │
//! │  │   │             │   │ ledger.rs    │   │ paginate()         │  │   │
//! │  │   │ SqlitePool  │   │ purchase.rs  │   │ COUNT + SELECT     │  │   │
//! │  │   │ migrations  │   │ ...          │   │ in one transaction │  │   │
//! │  │   └─────────────┘   └──────────────┘   └────────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   aggregate.rs: sum_where / count_where / group_sum_where      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and repository access
//! - [`migrations`] - Embedded database migrations
//! - [`query`] - Filters, sort allow-lists and transactional pagination
//! - [`aggregate`] - Read-only report sums and counts
//! - [`repository`] - One repository per resource
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zarmind_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("zarmind.db")).await?;
//!
//! let page = db.customers().list(&query).await?;
//! let invoice = db.payables().get(&id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use aggregate::GroupTotal;
pub use query::{Filter, Resource};

// Repository re-exports for convenience
pub use repository::branch::BranchRepository;
pub use repository::cash::{CashRepository, CashTotals};
pub use repository::customer::CustomerRepository;
pub use repository::employee::{EmployeeCounts, EmployeeRepository};
pub use repository::expense::{ExpenseRepository, ExpenseTotals};
pub use repository::ledger::{LedgerRepository, LedgerTotals};
pub use repository::payroll::PayrollRepository;
pub use repository::product::{InventoryTotals, ProductRepository};
pub use repository::purchase::{PurchaseRepository, PurchaseTotals};
pub use repository::setting::SettingRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
pub use repository::work_order::WorkOrderRepository;
pub use repository::workshop::WorkshopRepository;
pub use repository::{append_note, new_id, Removal};

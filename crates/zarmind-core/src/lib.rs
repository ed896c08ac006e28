//! # zarmind-core: Pure Business Rules for Zarmind ERP
//!
//! Every rule that decides what a jewelry-business record may look like
//! lives here, as plain functions over plain values. Nothing in this crate
//! touches a database, a cache or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Zarmind ERP Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum, apps/api)                    │   │
//! │  │   auth guard ──► parse ──► service ──► JSON / cache-aside       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ zarmind-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ numeric │ │  money  │ │ status  │ │  codes  │ │ paging  │  │   │
//! │  │   │toNumber │ │  Money  │ │ Ledger  │ │ PUR-..  │ │ Page    │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  zarmind-db (Database Layer)                    │   │
//! │  │        SQLite, query builder, repositories, aggregates          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`numeric`] - Total number normalizer (`to_number`)
//! - [`money`] - Money in minor units, serialized as major-unit numbers
//! - [`status`] - Ledger status derivation, payments, quantity deltas, aging
//! - [`codes`] - Human-readable business identifiers
//! - [`json`] - Values stored as JSON text columns
//! - [`paging`] - Page/limit/sort request and paged results
//! - [`types`] - Domain entities, create payloads, patches and enums
//! - [`validation`] - Field-level input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use zarmind_core::money::Money;
//! use zarmind_core::status::LedgerAmounts;
//! use zarmind_core::LedgerStatus;
//!
//! let invoice = LedgerAmounts::new(Money::from_major(1000.0), Money::zero()).unwrap();
//! assert_eq!(invoice.status(), LedgerStatus::Pending);
//!
//! let invoice = invoice.record_payment(Money::from_major(400.0)).unwrap();
//! assert_eq!(invoice.status(), LedgerStatus::Partial);
//! assert_eq!(invoice.remaining(), Money::from_major(600.0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codes;
pub mod error;
pub mod json;
pub mod money;
pub mod numeric;
pub mod paging;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use json::JsonText;
pub use money::Money;
pub use numeric::{to_number, ToNumber};
pub use paging::{ListParams, PageRequest, PagedResult, SortOrder};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used by list endpoints that do not declare their own.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Minimum stock assigned to a branch inventory row when none is given.
pub const DEFAULT_MINIMUM_STOCK: i64 = 10;

//! # Error Types
//!
//! Domain-specific error types for zarmind-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  zarmind-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  zarmind-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP API errors (apps/api)                                            │
//! │  └── ApiError         - What clients see (status + JSON body)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError (400)                    │
//! │        DbError::NotFound            → ApiError (404)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rules are checked before any mutation, so an `Err` from this
//! crate always means nothing was written.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record referenced by the request does not exist.
    ///
    /// ## When This Occurs
    /// - Creating a payable for an unknown supplier
    /// - Allocating stock to an unknown branch
    /// - Ordering a product that was deleted
    ///
    /// Distinct from a missing *target* record (404): the request itself
    /// is malformed, so this maps to 400.
    #[error("{entity} not found")]
    ReferenceNotFound { entity: String },

    /// A payment would push the paid amount above the invoice amount.
    ///
    /// ## User Workflow
    /// ```text
    /// Invoice 1000, paid 1000 (PAID)
    ///      │
    ///      ▼
    /// record_payment(1)
    ///      │
    ///      ▼
    /// Overpayment { amount: 1000, paid: 1000, requested: 1 }
    ///      │
    ///      ▼
    /// 400 "Payment amount exceeds total amount", record unchanged
    /// ```
    #[error("Payment amount exceeds total amount")]
    Overpayment {
        amount: Money,
        paid: Money,
        requested: Money,
    },

    /// A signed quantity change would leave a negative balance.
    #[error("Adjustment would result in negative quantity")]
    NegativeQuantity { current: i64, delta: i64 },

    /// Any other rule, carried with the exact message shown to the client.
    #[error("{0}")]
    BusinessRule(String),

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for [`CoreError::ReferenceNotFound`].
    pub fn reference_not_found(entity: impl Into<String>) -> Self {
        CoreError::ReferenceNotFound {
            entity: entity.into(),
        }
    }

    /// Shorthand for [`CoreError::BusinessRule`].
    pub fn rule(message: impl Into<String>) -> Self {
        CoreError::BusinessRule(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a payload is well-formed JSON but breaks a field rule.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., bad email, non-numeric setting value).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value on a field that must be unique.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

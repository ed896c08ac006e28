//! # Validation Module
//!
//! Field-level checks run by services before anything is written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: JSON deserialization (serde)                                 │
//! │  ├── Shape and enum values                                             │
//! │  └── Numeric-like amounts normalized via to_number                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + status rules                                   │
//! │  ├── Required fields, lengths, ranges                                  │
//! │  └── Referenced records checked by the service                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (codes, sku, email, national id, setting key)              │
//! │  └── FOREIGN KEY constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text name accepted anywhere.
pub const MAX_NAME_LEN: usize = 200;

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Required, at most [`MAX_NAME_LEN`] characters.
///
/// ```rust
/// use zarmind_core::validation::validate_name;
///
/// assert!(validate_name("name", "Tehran Gold Co.").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;
    if value.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Digits with an optional leading `+`, separators ignored, 7..=15 digits.
pub fn validate_phone(value: &str) -> ValidationResult<()> {
    validate_required("phone", value)?;
    let compact: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }
    if !(7..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must have 7 to 15 digits".to_string(),
        });
    }
    Ok(())
}

/// Minimal shape check: `local@domain.tld`.
pub fn validate_email(value: &str) -> ValidationResult<()> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }
    Ok(())
}

/// Supplier/workshop rating, 1 to 5 inclusive.
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    validate_score("rating", rating)
}

/// A 1 to 5 score on a named field.
pub fn validate_score(field: &str, score: i64) -> ValidationResult<()> {
    if !(1..=5).contains(&score) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: 5,
        });
    }
    Ok(())
}

pub fn validate_positive_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_amount(field: &str, value: Money) -> ValidationResult<()> {
    if !value.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, value: Money) -> ValidationResult<()> {
    if value.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

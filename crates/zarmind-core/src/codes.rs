//! # Business Identifier Generation
//!
//! Human-readable codes printed on invoices, labels and reports.
//!
//! ```text
//! generate_code("PUR")              → PUR-250314-M7Q2K9XZ
//!                                      │    │      └─ now (ms) in base36
//!                                      │    └─ YYMMDD (UTC)
//!                                      └─ prefix
//!
//! generate_code_with_suffix("CUST") → CUST-250314-101502-4KQZ
//!                                            │       └─ 4 random base36 chars
//!                                            └─ HHMMSS (UTC)
//! ```
//!
//! Codes are not guaranteed unique on their own; the database unique
//! constraints are the final arbiter.

use chrono::{DateTime, Utc};
use uuid::Uuid;

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `PREFIX-YYMMDD-BASE36(now_ms)`.
pub fn generate_code(prefix: &str) -> String {
    generate_code_at(prefix, Utc::now())
}

/// [`generate_code`] with an explicit clock.
pub fn generate_code_at(prefix: &str, now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    format!("{}-{}-{}", prefix, now.format("%y%m%d"), to_base36(millis))
}

/// `PREFIX-YYMMDD-HHMMSS-XXXX` with a random base36 suffix.
pub fn generate_code_with_suffix(prefix: &str) -> String {
    generate_code_with_suffix_at(prefix, Utc::now())
}

/// [`generate_code_with_suffix`] with an explicit clock.
pub fn generate_code_with_suffix_at(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        now.format("%y%m%d-%H%M%S"),
        random_base36(4)
    )
}

/// Upper-case base36 rendering of an unsigned integer.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

// UUID v4 bytes are the randomness source.
fn random_base36(len: usize) -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(len)
        .map(|b| char::from(BASE36_DIGITS[(*b as usize) % 36]))
        .collect()
}

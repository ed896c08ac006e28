//! # Numeric Normalizer
//!
//! Turns any numeric-like value into a canonical `f64`.
//!
//! Amounts reach the system in many shapes: JSON numbers, numeric strings
//! from query parameters, `NULL` sums from SQLite, integer minor units from
//! the database. [`to_number`] accepts all of them and never fails.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input                         │ Output                                 │
//! │  ──────────────────────────────┼─────────────────────────────────────── │
//! │  42 (number)                   │ 42.0   returned as-is                  │
//! │  Money(4250) (minor units)     │ 42.5   guarded fixed-point path        │
//! │  "42" / " 42.5 "               │ 42.0 / 42.5                            │
//! │  "abc", "1,000", "", NaN, ±inf │ 0.0                                    │
//! │  None / JSON null              │ 0.0                                    │
//! │  JSON true / false             │ 1.0 / 0.0                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The function is total and idempotent: `to_number(to_number(x)) == to_number(x)`.

use crate::money::Money;

/// Values that can be read as a number.
///
/// `try_to_number` returns `None` when the value has no numeric reading.
/// Callers normally go through [`to_number`], which maps `None` to `0.0`.
pub trait ToNumber {
    fn try_to_number(&self) -> Option<f64>;
}

/// Normalizes any numeric-like value to a finite `f64`, defaulting to `0.0`.
///
/// ## Example
/// ```rust
/// use zarmind_core::numeric::to_number;
///
/// assert_eq!(to_number(&42_i64), 42.0);
/// assert_eq!(to_number("42"), 42.0);
/// assert_eq!(to_number("abc"), 0.0);
/// assert_eq!(to_number(&None::<i64>), 0.0);
/// ```
pub fn to_number<T: ToNumber + ?Sized>(value: &T) -> f64 {
    match value.try_to_number() {
        Some(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

// =============================================================================
// Implementations
// =============================================================================

impl ToNumber for f64 {
    fn try_to_number(&self) -> Option<f64> {
        Some(*self)
    }
}

impl ToNumber for f32 {
    fn try_to_number(&self) -> Option<f64> {
        Some(f64::from(*self))
    }
}

impl ToNumber for i64 {
    fn try_to_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl ToNumber for i32 {
    fn try_to_number(&self) -> Option<f64> {
        Some(f64::from(*self))
    }
}

impl ToNumber for u32 {
    fn try_to_number(&self) -> Option<f64> {
        Some(f64::from(*self))
    }
}

impl ToNumber for Money {
    fn try_to_number(&self) -> Option<f64> {
        Some(self.to_major())
    }
}

impl ToNumber for str {
    fn try_to_number(&self) -> Option<f64> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<f64>().ok()
    }
}

impl ToNumber for String {
    fn try_to_number(&self) -> Option<f64> {
        self.as_str().try_to_number()
    }
}

impl ToNumber for serde_json::Value {
    fn try_to_number(&self) -> Option<f64> {
        match self {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.try_to_number(),
            serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl<T: ToNumber> ToNumber for Option<T> {
    fn try_to_number(&self) -> Option<f64> {
        self.as_ref().and_then(ToNumber::try_to_number)
    }
}

impl<T: ToNumber + ?Sized> ToNumber for &T {
    fn try_to_number(&self) -> Option<f64> {
        (**self).try_to_number()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_numbers_pass_through() {
        assert_eq!(to_number(&42_i64), 42.0);
        assert_eq!(to_number(&42.5_f64), 42.5);
        assert_eq!(to_number(&-7_i32), -7.0);
    }

    #[test]
    fn test_strings() {
        assert_eq!(to_number("42"), 42.0);
        assert_eq!(to_number(" 12.75 "), 12.75);
        assert_eq!(to_number("abc"), 0.0);
        assert_eq!(to_number(""), 0.0);
        assert_eq!(to_number(&"1e3".to_string()), 1000.0);
        assert_eq!(to_number("1,000"), 0.0);
    }

    #[test]
    fn test_missing_and_non_finite_become_zero() {
        assert_eq!(to_number(&None::<i64>), 0.0);
        assert_eq!(to_number(&Some(5_i64)), 5.0);
        assert_eq!(to_number(&f64::NAN), 0.0);
        assert_eq!(to_number(&f64::INFINITY), 0.0);
        assert_eq!(to_number("NaN"), 0.0);
    }

    #[test]
    fn test_json_values() {
        assert_eq!(to_number(&json!(null)), 0.0);
        assert_eq!(to_number(&json!(42)), 42.0);
        assert_eq!(to_number(&json!("42")), 42.0);
        assert_eq!(to_number(&json!("abc")), 0.0);
        assert_eq!(to_number(&json!(true)), 1.0);
        assert_eq!(to_number(&json!([1, 2])), 0.0);
    }

    #[test]
    fn test_fixed_point_money() {
        assert_eq!(to_number(&Money::from_cents(4250)), 42.5);
        assert_eq!(to_number(&Some(Money::from_cents(-100))), -1.0);
    }

    #[test]
    fn test_idempotent() {
        for input in ["42", "abc", "-3.5", "", "1e400"] {
            let once = to_number(input);
            assert_eq!(to_number(&once), once, "input {input:?}");
        }
    }
}

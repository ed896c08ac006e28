//! # Money Module
//!
//! Provides the `Money` type for monetary values.
//!
//! ## Storage vs. Wire
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite column          Rust              JSON (API)                    │
//! │  ─────────────          ────              ──────────                    │
//! │  amount_cents = 100050  Money(100050)     "amount": 1000.5              │
//! │                                                                         │
//! │  Arithmetic and comparisons happen on integer minor units, so          │
//! │  400 + 600 == 1000 exactly and the PAID check never drifts.            │
//! │  Only the API boundary converts to and from major-unit numbers.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entity fields use `#[serde(with = "crate::money::major")]` so clients see
//! plain numbers; anything numeric-like is accepted on input via
//! [`to_number`](crate::numeric::to_number).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Minor units per major unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Largest absolute major-unit amount accepted from clients.
pub const MAX_MAJOR: f64 = 1e13;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (1/100 of the major currency unit).
///
/// Signed, so balance corrections and quantity-priced refunds stay
/// representable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a major-unit number, rounding half away
    /// from zero to the nearest minor unit.
    ///
    /// Returns `None` for non-finite input and for anything beyond
    /// [`MAX_MAJOR`] in either direction.
    ///
    /// ## Example
    /// ```rust
    /// use zarmind_core::money::Money;
    ///
    /// assert_eq!(Money::try_from_major(1000.5).map(|m| m.cents()), Some(100_050));
    /// assert_eq!(Money::try_from_major(1e17), None);
    /// assert_eq!(Money::try_from_major(f64::NAN), None);
    /// ```
    pub fn try_from_major(major: f64) -> Option<Self> {
        if !major.is_finite() || major.abs() > MAX_MAJOR {
            return None;
        }
        Some(Money((major * MINOR_PER_MAJOR as f64).round() as i64))
    }

    /// Infallible form of [`Money::try_from_major`] for trusted literals.
    /// Input it would reject becomes zero.
    ///
    /// ```rust
    /// use zarmind_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(0.125).cents(), 13);
    /// assert_eq!(Money::from_major(f64::NAN).cents(), 0);
    /// assert_eq!(Money::from_major(1e17).cents(), 0);
    /// ```
    pub fn from_major(major: f64) -> Self {
        Money::try_from_major(major).unwrap_or_default()
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as a major-unit number (for JSON and reports).
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn checked_add(self, rhs: Money) -> Option<Money> {
        match self.0.checked_add(rhs.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, rhs: Money) -> Option<Money> {
        match self.0.checked_sub(rhs.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies a unit price by a quantity, `None` on overflow.
    ///
    /// ```rust
    /// use zarmind_core::money::Money;
    ///
    /// let unit = Money::from_major(2500.0);
    /// assert_eq!(unit.multiply_quantity(3), Some(Money::from_major(7500.0)));
    /// assert_eq!(Money::from_cents(i64::MAX).multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds up amounts, `None` if the total leaves the `i64` range.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(items: I) -> Option<Money> {
        items
            .into_iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / MINOR_PER_MAJOR,
            abs % MINOR_PER_MAJOR
        )
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Major-Unit Serde Adapters
// =============================================================================

/// Serializes `Money` as a major-unit JSON number and accepts any
/// numeric-like JSON value on input.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use zarmind_core::money::Money;
///
/// #[derive(Serialize, Deserialize)]
/// struct Invoice {
///     #[serde(with = "zarmind_core::money::major")]
///     amount: Money,
/// }
///
/// let invoice: Invoice = serde_json::from_str(r#"{"amount":"1000.50"}"#).unwrap();
/// assert_eq!(invoice.amount.cents(), 100_050);
/// assert_eq!(serde_json::to_string(&invoice).unwrap(), r#"{"amount":1000.5}"#);
/// ```
pub mod major {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Money;
    use crate::numeric::to_number;

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.to_major())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        parse(&raw)
    }

    /// Reads a numeric-like JSON value; amounts beyond [`MAX_MAJOR`](super::MAX_MAJOR) are an error.
    pub(super) fn parse<E: serde::de::Error>(raw: &serde_json::Value) -> Result<Money, E> {
        Money::try_from_major(to_number(raw))
            .ok_or_else(|| E::custom("amount is out of range"))
    }

    /// Same as the parent module, for `Option<Money>` fields.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::Money;

        pub fn serialize<S: Serializer>(
            value: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(money) => serializer.serialize_some(&money.to_major()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
            Ok(match raw {
                None | Some(serde_json::Value::Null) => None,
                Some(value) => Some(super::parse::<D::Error>(&value)?),
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

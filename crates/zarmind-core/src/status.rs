//! # Status Derivation & Balance Rules
//!
//! The rules that keep ledger records and stock counters consistent.
//!
//! ## Ledger Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  paid <= 0              → PENDING                                      │
//! │  0 < paid < amount      → PARTIAL                                      │
//! │  paid >= amount         → PAID                                         │
//! │                                                                         │
//! │  remaining = amount - paid            (recomputed on every change)     │
//! │                                                                         │
//! │  PENDING ──pay──► PARTIAL ──pay──► PAID ──pay──► ✗ Overpayment         │
//! │     └─────────────pay in full─────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation here returns a *new* value. A rejected operation leaves
//! the caller's value untouched, which is what makes "rejected payment
//! leaves the record unchanged" hold by construction.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::LedgerStatus;

// =============================================================================
// Ledger Status
// =============================================================================

impl LedgerStatus {
    /// Derives the payment status from an invoice amount and the amount paid.
    ///
    /// ```rust
    /// use zarmind_core::{LedgerStatus, Money};
    ///
    /// let amount = Money::from_major(1000.0);
    /// assert_eq!(LedgerStatus::derive(amount, Money::zero()), LedgerStatus::Pending);
    /// assert_eq!(LedgerStatus::derive(amount, Money::from_major(400.0)), LedgerStatus::Partial);
    /// assert_eq!(LedgerStatus::derive(amount, amount), LedgerStatus::Paid);
    /// ```
    pub fn derive(amount: Money, paid: Money) -> LedgerStatus {
        if paid >= amount && paid.is_positive() {
            LedgerStatus::Paid
        } else if paid.is_positive() {
            LedgerStatus::Partial
        } else {
            LedgerStatus::Pending
        }
    }

    /// Open records still carry a balance.
    pub fn is_open(&self) -> bool {
        !matches!(self, LedgerStatus::Paid)
    }
}

// =============================================================================
// Ledger Amounts
// =============================================================================

/// The amount/paid pair of a ledger record, always in a valid state:
/// `amount > 0`, `0 <= paid <= amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerAmounts {
    amount: Money,
    paid: Money,
}

impl LedgerAmounts {
    /// Validates a fresh amount/paid pair.
    ///
    /// ## Errors
    /// - `amount <= 0` → [`ValidationError::MustBePositive`]
    /// - `paid < 0` → [`ValidationError::MustNotBeNegative`]
    /// - `paid > amount` → [`CoreError::Overpayment`]
    pub fn new(amount: Money, paid: Money) -> CoreResult<Self> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }
        if paid.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "paidAmount".to_string(),
            }
            .into());
        }
        if paid > amount {
            return Err(CoreError::Overpayment {
                amount,
                paid: Money::zero(),
                requested: paid,
            });
        }
        Ok(LedgerAmounts { amount, paid })
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn paid(&self) -> Money {
        self.paid
    }

    pub fn remaining(&self) -> Money {
        self.amount - self.paid
    }

    pub fn status(&self) -> LedgerStatus {
        LedgerStatus::derive(self.amount, self.paid)
    }

    /// Merges a partial update; `None` keeps the current value.
    pub fn merge(&self, amount: Option<Money>, paid: Option<Money>) -> CoreResult<Self> {
        LedgerAmounts::new(amount.unwrap_or(self.amount), paid.unwrap_or(self.paid))
    }

    /// Adds a payment.
    ///
    /// Over-payment is a hard error, never a clamp.
    ///
    /// ```rust
    /// use zarmind_core::status::LedgerAmounts;
    /// use zarmind_core::Money;
    ///
    /// let paid_off = LedgerAmounts::new(Money::from_major(10.0), Money::from_major(10.0)).unwrap();
    /// assert!(paid_off.record_payment(Money::from_major(1.0)).is_err());
    /// assert_eq!(paid_off.paid(), Money::from_major(10.0));
    /// ```
    pub fn record_payment(&self, payment: Money) -> CoreResult<Self> {
        if !payment.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "paymentAmount".to_string(),
            }
            .into());
        }
        match self.paid.checked_add(payment) {
            Some(new_paid) if new_paid <= self.amount => Ok(LedgerAmounts {
                amount: self.amount,
                paid: new_paid,
            }),
            _ => Err(CoreError::Overpayment {
                amount: self.amount,
                paid: self.paid,
                requested: payment,
            }),
        }
    }
}

// =============================================================================
// Quantity Deltas
// =============================================================================

/// Applies a signed delta to a stock counter, rejecting negative results.
///
/// ```rust
/// use zarmind_core::status::apply_quantity_delta;
///
/// assert_eq!(apply_quantity_delta(3, 2).unwrap(), 5);
/// assert!(apply_quantity_delta(3, -5).is_err());
/// ```
pub fn apply_quantity_delta(current: i64, delta: i64) -> CoreResult<i64> {
    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ => Err(CoreError::NegativeQuantity { current, delta }),
    }
}

// =============================================================================
// Aging
// =============================================================================

/// Overdue bucket for aging reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgingBucket {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Days1To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    pub fn from_days_overdue(days: i64) -> AgingBucket {
        match days {
            d if d <= 0 => AgingBucket::Current,
            1..=30 => AgingBucket::Days1To30,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Days1To30 => "1-30 days",
            AgingBucket::Days31To60 => "31-60 days",
            AgingBucket::Days61To90 => "61-90 days",
            AgingBucket::Over90 => "90+ days",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn major(v: f64) -> Money {
        Money::from_major(v)
    }

    #[test]
    fn test_derive_status_boundaries() {
        let amount = major(1000.0);
        assert_eq!(LedgerStatus::derive(amount, major(0.0)), LedgerStatus::Pending);
        assert_eq!(LedgerStatus::derive(amount, major(-1.0)), LedgerStatus::Pending);
        assert_eq!(LedgerStatus::derive(amount, major(0.01)), LedgerStatus::Partial);
        assert_eq!(LedgerStatus::derive(amount, major(999.99)), LedgerStatus::Partial);
        assert_eq!(LedgerStatus::derive(amount, major(1000.0)), LedgerStatus::Paid);
    }

    #[test]
    fn test_payment_scenario() {
        let entry = LedgerAmounts::new(major(1000.0), Money::zero()).unwrap();
        assert_eq!(entry.status(), LedgerStatus::Pending);
        assert_eq!(entry.remaining(), major(1000.0));

        let entry = entry.record_payment(major(400.0)).unwrap();
        assert_eq!(entry.status(), LedgerStatus::Partial);
        assert_eq!(entry.remaining(), major(600.0));

        let entry = entry.record_payment(major(600.0)).unwrap();
        assert_eq!(entry.status(), LedgerStatus::Paid);
        assert_eq!(entry.remaining(), Money::zero());

        let err = entry.record_payment(major(1.0)).unwrap_err();
        assert!(matches!(err, CoreError::Overpayment { .. }));
        assert_eq!(entry.paid(), major(1000.0));
        assert_eq!(entry.status(), LedgerStatus::Paid);
    }

    #[test]
    fn test_payment_must_be_positive() {
        let entry = LedgerAmounts::new(major(10.0), Money::zero()).unwrap();
        assert!(entry.record_payment(Money::zero()).is_err());
        assert!(entry.record_payment(major(-5.0)).is_err());
    }

    #[test]
    fn test_payment_overflow_is_overpayment() {
        assert!(LedgerAmounts::new(major(1e17), major(1e17)).is_err());

        let huge = Money::from_cents(i64::MAX);
        let entry = LedgerAmounts::new(huge, huge).unwrap();
        assert!(matches!(
            entry.record_payment(huge),
            Err(CoreError::Overpayment { .. })
        ));

        let entry = LedgerAmounts::new(huge, Money::from_cents(1)).unwrap();
        assert!(entry.record_payment(huge).is_err());
        assert_eq!(entry.paid(), Money::from_cents(1));
    }

    #[test]
    fn test_new_rejects_invalid_pairs() {
        assert!(LedgerAmounts::new(Money::zero(), Money::zero()).is_err());
        assert!(LedgerAmounts::new(major(10.0), major(-1.0)).is_err());
        assert!(matches!(
            LedgerAmounts::new(major(10.0), major(11.0)),
            Err(CoreError::Overpayment { .. })
        ));
    }

    #[test]
    fn test_merge_recomputes() {
        let entry = LedgerAmounts::new(major(1000.0), major(400.0)).unwrap();

        let lowered = entry.merge(Some(major(400.0)), None).unwrap();
        assert_eq!(lowered.status(), LedgerStatus::Paid);
        assert_eq!(lowered.remaining(), Money::zero());

        assert!(entry.merge(Some(major(300.0)), None).is_err());

        let unchanged = entry.merge(None, None).unwrap();
        assert_eq!(unchanged, entry);
    }

    #[test]
    fn test_quantity_delta() {
        assert_eq!(apply_quantity_delta(3, -3).unwrap(), 0);
        assert!(matches!(
            apply_quantity_delta(3, -5),
            Err(CoreError::NegativeQuantity { current: 3, delta: -5 })
        ));
        assert!(apply_quantity_delta(i64::MAX, 1).is_err());
    }

    #[test]
    fn test_aging_buckets() {
        assert_eq!(AgingBucket::from_days_overdue(-3), AgingBucket::Current);
        assert_eq!(AgingBucket::from_days_overdue(0), AgingBucket::Current);
        assert_eq!(AgingBucket::from_days_overdue(1), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::from_days_overdue(30), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::from_days_overdue(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::from_days_overdue(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::from_days_overdue(91), AgingBucket::Over90);
        assert_eq!(AgingBucket::Over90.label(), "90+ days");
    }
}

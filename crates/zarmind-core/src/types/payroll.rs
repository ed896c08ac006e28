//! Payroll runs.
//!
//! ```text
//! totalEarnings   = baseSalary + commission + bonus + overtime + allowances
//! totalDeductions = tax + insurance + loan + otherDeductions
//! netSalary       = totalEarnings - totalDeductions
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::PaymentMethod;
use crate::money::Money;
use crate::paging::ListParams;

/// One pay period for one employee. Totals are computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payroll {
    pub id: String,
    pub employee_id: String,
    #[ts(as = "String")]
    pub pay_period_start: NaiveDate,
    #[ts(as = "String")]
    pub pay_period_end: NaiveDate,
    #[ts(as = "String")]
    pub pay_date: NaiveDate,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub base_salary: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub commission: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub bonus: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub overtime: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub allowances: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub tax: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub insurance: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub loan: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub other_deductions: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub total_earnings: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub total_deductions: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub net_salary: Money,
    pub paid: bool,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Earning and deduction lines of a payroll run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayLines {
    pub base_salary: Money,
    pub commission: Money,
    pub bonus: Money,
    pub overtime: Money,
    pub allowances: Money,
    pub tax: Money,
    pub insurance: Money,
    pub loan: Money,
    pub other_deductions: Money,
}

/// `(totalEarnings, totalDeductions, netSalary)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayTotals {
    pub earnings: Money,
    pub deductions: Money,
    pub net: Money,
}

impl PayLines {
    /// Every line with its wire name, earnings first.
    pub fn named(&self) -> [(&'static str, Money); 9] {
        [
            ("baseSalary", self.base_salary),
            ("commission", self.commission),
            ("bonus", self.bonus),
            ("overtime", self.overtime),
            ("allowances", self.allowances),
            ("tax", self.tax),
            ("insurance", self.insurance),
            ("loan", self.loan),
            ("otherDeductions", self.other_deductions),
        ]
    }

    /// `None` when a sum leaves the representable range.
    ///
    /// ```rust
    /// use zarmind_core::{Money, PayLines};
    ///
    /// let lines = PayLines {
    ///     base_salary: Money::from_major(3000.0),
    ///     bonus: Money::from_major(500.0),
    ///     tax: Money::from_major(350.0),
    ///     ..PayLines::default()
    /// };
    /// let totals = lines.totals().unwrap();
    /// assert_eq!(totals.earnings, Money::from_major(3500.0));
    /// assert_eq!(totals.net, Money::from_major(3150.0));
    /// ```
    pub fn totals(&self) -> Option<PayTotals> {
        let earnings = Money::checked_sum([
            self.base_salary,
            self.commission,
            self.bonus,
            self.overtime,
            self.allowances,
        ])?;
        let deductions =
            Money::checked_sum([self.tax, self.insurance, self.loan, self.other_deductions])?;
        Some(PayTotals {
            earnings,
            deductions,
            net: earnings.checked_sub(deductions)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayroll {
    #[serde(default)]
    pub employee_id: String,
    pub pay_period_start: Option<NaiveDate>,
    pub pay_period_end: Option<NaiveDate>,
    pub pay_date: Option<NaiveDate>,
    /// Defaults to the employee's base salary.
    #[serde(default, with = "crate::money::major::option")]
    pub base_salary: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub commission: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub bonus: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub overtime: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub allowances: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub tax: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub insurance: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub loan: Option<Money>,
    #[serde(default, with = "crate::money::major::option")]
    pub other_deductions: Option<Money>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub employee_id: Option<String>,
    /// `true`/`false`; absent lists both.
    pub paid: Option<String>,
    /// Inclusive bounds on `payDate`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPayroll {
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_sum_each_side() {
        let major = Money::from_major;
        let lines = PayLines {
            base_salary: major(2000.0),
            commission: major(150.5),
            overtime: major(100.0),
            allowances: major(50.0),
            insurance: major(140.0),
            loan: major(200.0),
            other_deductions: major(10.5),
            ..PayLines::default()
        };
        let totals = lines.totals().unwrap();
        assert_eq!(totals.earnings, major(2300.5));
        assert_eq!(totals.deductions, major(350.5));
        assert_eq!(totals.net, major(1950.0));
    }

    #[test]
    fn test_totals_overflow_is_none() {
        let lines = PayLines {
            base_salary: Money::from_cents(i64::MAX),
            bonus: Money::from_cents(1),
            ..PayLines::default()
        };
        assert!(lines.totals().is_none());
    }

    #[test]
    fn test_net_may_be_negative() {
        let lines = PayLines {
            base_salary: Money::from_major(100.0),
            loan: Money::from_major(150.0),
            ..PayLines::default()
        };
        assert_eq!(lines.totals().unwrap().net, Money::from_major(-50.0));
    }
}

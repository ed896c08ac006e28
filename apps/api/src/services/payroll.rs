//! Payroll runs.
//!
//! Totals are always computed here from the individual lines; clients never
//! send them. A run is created unpaid and flipped to paid exactly once.

use chrono::{NaiveDate, Utc};
use tracing::info;

use super::{clean, out_of_range, require_reference};
use crate::error::{ApiError, ApiResult};
use zarmind_core::validation::validate_non_negative;
use zarmind_core::{
    GeneratePayroll, PagedResult, PayLines, PayPayroll, PaymentMethod, Payroll, PayrollQuery,
    ValidationError,
};
use zarmind_db::{new_id, Database};

pub struct PayrollService {
    db: Database,
}

impl PayrollService {
    pub fn new(db: &Database) -> Self {
        PayrollService { db: db.clone() }
    }

    /// Creates an unpaid run. `baseSalary` defaults to the employee's.
    pub async fn generate(&self, input: GeneratePayroll) -> ApiResult<Payroll> {
        let start = required("payPeriodStart", input.pay_period_start)?;
        let end = required("payPeriodEnd", input.pay_period_end)?;
        let pay_date = required("payDate", input.pay_date)?;
        if end < start {
            return Err(ApiError::validation(
                "payPeriodEnd must not be before payPeriodStart",
            ));
        }

        let employee = self.db.employees().get_by_id(&input.employee_id).await?;
        require_reference(employee.is_some(), "Employee")?;
        let employee_salary = employee.map(|e| e.base_salary).unwrap_or_default();

        let lines = PayLines {
            base_salary: input.base_salary.unwrap_or(employee_salary),
            commission: input.commission.unwrap_or_default(),
            bonus: input.bonus.unwrap_or_default(),
            overtime: input.overtime.unwrap_or_default(),
            allowances: input.allowances.unwrap_or_default(),
            tax: input.tax.unwrap_or_default(),
            insurance: input.insurance.unwrap_or_default(),
            loan: input.loan.unwrap_or_default(),
            other_deductions: input.other_deductions.unwrap_or_default(),
        };
        for (field, amount) in lines.named() {
            validate_non_negative(field, amount)?;
        }
        let totals = lines.totals().ok_or_else(|| out_of_range("netSalary"))?;

        let now = Utc::now();
        let payroll = Payroll {
            id: new_id(),
            employee_id: input.employee_id,
            pay_period_start: start,
            pay_period_end: end,
            pay_date,
            base_salary: lines.base_salary,
            commission: lines.commission,
            bonus: lines.bonus,
            overtime: lines.overtime,
            allowances: lines.allowances,
            tax: lines.tax,
            insurance: lines.insurance,
            loan: lines.loan,
            other_deductions: lines.other_deductions,
            total_earnings: totals.earnings,
            total_deductions: totals.deductions,
            net_salary: totals.net,
            paid: false,
            paid_at: None,
            payment_method: input.payment_method,
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };
        let payroll = self.db.payroll().insert(&payroll).await?;
        info!(
            id = %payroll.id,
            employee = %payroll.employee_id,
            net = %payroll.net_salary,
            "Payroll generated"
        );
        Ok(payroll)
    }

    pub async fn list(&self, query: &PayrollQuery) -> ApiResult<PagedResult<Payroll>> {
        Ok(self.db.payroll().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Payroll> {
        Ok(self.db.payroll().get(id).await?)
    }

    /// Marks a run paid. Method defaults to cash; given notes replace the old.
    pub async fn mark_paid(&self, id: &str, input: PayPayroll) -> ApiResult<Payroll> {
        let repo = self.db.payroll();
        let payroll = repo.get(id).await?;
        if payroll.paid {
            return Err(ApiError::bad_request("Already marked as paid"));
        }

        let notes = clean(input.notes).or(payroll.notes);
        let flipped = repo
            .mark_paid(
                id,
                input.paid_at.unwrap_or_else(Utc::now),
                Some(input.payment_method.unwrap_or(PaymentMethod::Cash)),
                notes.as_deref(),
            )
            .await?;
        if !flipped {
            return Err(ApiError::bad_request("Already marked as paid"));
        }

        info!(id = %id, "Payroll marked paid");
        Ok(repo.get(id).await?)
    }

    /// Only unpaid runs can be deleted.
    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        let repo = self.db.payroll();
        if repo.get(id).await?.paid {
            return Err(ApiError::bad_request("Cannot delete a paid payroll record"));
        }
        repo.delete(id).await?;
        info!(id = %id, "Payroll record deleted");
        Ok(())
    }
}

fn required(field: &str, value: Option<NaiveDate>) -> ApiResult<NaiveDate> {
    value.ok_or_else(|| {
        ValidationError::Required {
            field: field.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::employees::EmployeeService;
    use crate::services::testing;
    use zarmind_core::{Employee, Money, NewEmployee};

    fn major(v: f64) -> Money {
        Money::from_major(v)
    }

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 10, d)
    }

    async fn employee(db: &Database) -> Employee {
        let branch = testing::branch(db, "Isfahan").await;
        EmployeeService::new(db)
            .create(NewEmployee {
                first_name: "Sara".to_string(),
                last_name: "Karimi".to_string(),
                phone: "09125556677".to_string(),
                branch_id: branch.id,
                base_salary: Some(major(2000.0)),
                ..NewEmployee::default()
            })
            .await
            .unwrap()
    }

    fn run(employee_id: &str) -> GeneratePayroll {
        GeneratePayroll {
            employee_id: employee_id.to_string(),
            pay_period_start: day(1),
            pay_period_end: day(30),
            pay_date: day(31),
            ..GeneratePayroll::default()
        }
    }

    #[tokio::test]
    async fn test_generate_defaults_and_totals() {
        let db = testing::database().await;
        let emp = employee(&db).await;
        let service = PayrollService::new(&db);

        let p = service
            .generate(GeneratePayroll {
                bonus: Some(major(300.0)),
                tax: Some(major(200.0)),
                loan: Some(major(50.0)),
                ..run(&emp.id)
            })
            .await
            .unwrap();
        assert_eq!(p.base_salary, major(2000.0));
        assert_eq!(p.total_earnings, major(2300.0));
        assert_eq!(p.total_deductions, major(250.0));
        assert_eq!(p.net_salary, major(2050.0));
        assert!(!p.paid);
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_input() {
        let db = testing::database().await;
        let emp = employee(&db).await;
        let service = PayrollService::new(&db);

        let err = service.generate(run("missing")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert_eq!(err.message, "Employee not found");

        let err = service
            .generate(GeneratePayroll {
                bonus: Some(major(-1.0)),
                ..run(&emp.id)
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "bonus must not be negative");

        let err = service
            .generate(GeneratePayroll {
                pay_date: None,
                ..run(&emp.id)
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "payDate is required");
    }

    #[tokio::test]
    async fn test_mark_paid_once_then_locked() {
        let db = testing::database().await;
        let emp = employee(&db).await;
        let service = PayrollService::new(&db);
        let p = service.generate(run(&emp.id)).await.unwrap();

        let paid = service
            .mark_paid(
                &p.id,
                PayPayroll {
                    notes: Some("October".to_string()),
                    ..PayPayroll::default()
                },
            )
            .await
            .unwrap();
        assert!(paid.paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(paid.notes.as_deref(), Some("October"));

        let err = service
            .mark_paid(&p.id, PayPayroll::default())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Already marked as paid");

        let err = service.remove(&p.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let err = service
            .mark_paid("missing", PayPayroll::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Payroll record not found");
    }
}

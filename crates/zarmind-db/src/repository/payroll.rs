//! # Payroll Repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::paging::parse_flag;
use zarmind_core::{
    PagedResult, PaymentMethod, Payroll, PayrollQuery, SortOrder, DEFAULT_PAGE_LIMIT,
};

pub const PAYROLL: Resource = Resource {
    entity: "Payroll record",
    table: "payroll",
    columns: "*",
    search_columns: &[],
    sort_columns: &[
        ("payDate", "pay_date"),
        ("payPeriodStart", "pay_period_start"),
        ("netSalary", "net_salary"),
        ("createdAt", "created_at"),
    ],
    default_sort: "pay_date",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

#[derive(Debug, Clone)]
pub struct PayrollRepository {
    pool: SqlitePool,
}

impl PayrollRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PayrollRepository { pool }
    }

    pub async fn list(&self, q: &PayrollQuery) -> DbResult<PagedResult<Payroll>> {
        let filter = Filter::new()
            .eq_opt("employee_id", q.employee_id.as_deref())
            .eq_opt("paid", parse_flag(q.paid.as_deref()))
            .range("pay_date", q.from, q.to);
        query::paginate(&self.pool, &PAYROLL, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payroll>> {
        query::fetch_optional(&self.pool, &PAYROLL, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Payroll> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(PAYROLL.entity, id))
    }

    pub async fn insert(&self, p: &Payroll) -> DbResult<Payroll> {
        debug!(employee = %p.employee_id, net = %p.net_salary, "Inserting payroll record");

        sqlx::query(
            r#"
            INSERT INTO payroll (
                id, employee_id, pay_period_start, pay_period_end, pay_date,
                base_salary, commission, bonus, overtime, allowances,
                tax, insurance, loan, other_deductions,
                total_earnings, total_deductions, net_salary,
                paid, paid_at, payment_method, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                      ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)
            "#,
        )
        .bind(&p.id)
        .bind(&p.employee_id)
        .bind(p.pay_period_start)
        .bind(p.pay_period_end)
        .bind(p.pay_date)
        .bind(p.base_salary)
        .bind(p.commission)
        .bind(p.bonus)
        .bind(p.overtime)
        .bind(p.allowances)
        .bind(p.tax)
        .bind(p.insurance)
        .bind(p.loan)
        .bind(p.other_deductions)
        .bind(p.total_earnings)
        .bind(p.total_deductions)
        .bind(p.net_salary)
        .bind(p.paid)
        .bind(p.paid_at)
        .bind(p.payment_method)
        .bind(&p.notes)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(p.clone())
    }

    /// Flips an unpaid record to paid. Zero rows means missing or already
    /// paid; the caller tells them apart.
    pub async fn mark_paid(
        &self,
        id: &str,
        at: DateTime<Utc>,
        method: Option<PaymentMethod>,
        notes: Option<&str>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Marking payroll paid");

        let result = sqlx::query(
            r#"
            UPDATE payroll SET
                paid = 1, paid_at = ?2, payment_method = COALESCE(?3, payment_method),
                notes = ?4, updated_at = ?5
            WHERE id = ?1 AND paid = 0
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(method)
        .bind(notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting payroll record");

        let result = sqlx::query("DELETE FROM payroll WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PAYROLL.entity, id));
        }
        Ok(())
    }
}

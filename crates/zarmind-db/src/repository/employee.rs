//! # Employee Repository
//!
//! Employees are never hard-deleted: removal sets `TERMINATED` and stamps
//! the termination date, so payroll and attendance history stays intact.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate;
use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::{
    Employee, EmployeeQuery, EmploymentStatus, PagedResult, SortOrder, DEFAULT_PAGE_LIMIT,
};

pub const EMPLOYEES: Resource = Resource {
    entity: "Employee",
    table: "employees",
    columns: "*",
    search_columns: &[
        "employee_code",
        "first_name",
        "last_name",
        "phone",
        "email",
        "national_id",
        "position",
    ],
    sort_columns: &[
        ("createdAt", "created_at"),
        ("hireDate", "hire_date"),
        ("firstName", "first_name"),
        ("employeeCode", "employee_code"),
    ],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

/// Head counts for the HR dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeCounts {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_department: BTreeMap<String, i64>,
    pub by_employment_type: BTreeMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    pub async fn list(&self, q: &EmployeeQuery) -> DbResult<PagedResult<Employee>> {
        let filter = Filter::new()
            .eq_opt("status", q.status)
            .eq_opt("employment_type", q.employment_type)
            .contains_opt("department", q.department.as_deref())
            .eq_opt("branch_id", q.branch_id.as_deref());
        query::paginate(&self.pool, &EMPLOYEES, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        query::fetch_optional(&self.pool, &EMPLOYEES, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Employee> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(EMPLOYEES.entity, id))
    }

    pub async fn code_exists(&self, code: &str) -> DbResult<bool> {
        let count = aggregate::count_where(
            &self.pool,
            "employees",
            &Filter::new().eq("employee_code", code),
        )
        .await?;
        Ok(count > 0)
    }

    /// Whether another employee already holds this national id.
    pub async fn national_id_taken(&self, national_id: &str, except: Option<&str>) -> DbResult<bool> {
        let mut filter = Filter::new().eq("national_id", national_id);
        if let Some(id) = except {
            filter = filter.not_eq("id", id);
        }
        Ok(aggregate::count_where(&self.pool, "employees", &filter).await? > 0)
    }

    pub async fn insert(&self, e: &Employee) -> DbResult<Employee> {
        debug!(code = %e.employee_code, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, employee_code, first_name, last_name, phone, email, national_id,
                position, department, employment_type, hire_date, termination_date,
                status, branch_id, base_salary, notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
        )
        .bind(&e.id)
        .bind(&e.employee_code)
        .bind(&e.first_name)
        .bind(&e.last_name)
        .bind(&e.phone)
        .bind(&e.email)
        .bind(&e.national_id)
        .bind(&e.position)
        .bind(&e.department)
        .bind(e.employment_type)
        .bind(e.hire_date)
        .bind(e.termination_date)
        .bind(e.status)
        .bind(&e.branch_id)
        .bind(e.base_salary)
        .bind(&e.notes)
        .bind(e.created_at)
        .bind(e.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(e.clone())
    }

    pub async fn update(&self, e: &Employee) -> DbResult<()> {
        debug!(id = %e.id, "Updating employee");

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                first_name = ?2, last_name = ?3, phone = ?4, email = ?5, national_id = ?6,
                position = ?7, department = ?8, employment_type = ?9, hire_date = ?10,
                termination_date = ?11, status = ?12, branch_id = ?13, base_salary = ?14,
                notes = ?15, updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(&e.id)
        .bind(&e.first_name)
        .bind(&e.last_name)
        .bind(&e.phone)
        .bind(&e.email)
        .bind(&e.national_id)
        .bind(&e.position)
        .bind(&e.department)
        .bind(e.employment_type)
        .bind(e.hire_date)
        .bind(e.termination_date)
        .bind(e.status)
        .bind(&e.branch_id)
        .bind(e.base_salary)
        .bind(&e.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EMPLOYEES.entity, &e.id));
        }
        Ok(())
    }

    /// Soft delete.
    pub async fn terminate(&self, id: &str, on: NaiveDate) -> DbResult<()> {
        debug!(id = %id, "Terminating employee");

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                status = ?2,
                termination_date = COALESCE(termination_date, ?3),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(EmploymentStatus::Terminated)
        .bind(on)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(EMPLOYEES.entity, id));
        }
        Ok(())
    }

    pub async fn counts(&self) -> DbResult<EmployeeCounts> {
        let all = Filter::new();
        Ok(EmployeeCounts {
            total: aggregate::count_where(&self.pool, "employees", &all).await?,
            by_status: aggregate::group_count_where(&self.pool, "employees", "status", &all)
                .await?,
            by_department: aggregate::group_count_where(
                &self.pool,
                "employees",
                "department",
                &all,
            )
            .await?,
            by_employment_type: aggregate::group_count_where(
                &self.pool,
                "employees",
                "employment_type",
                &all,
            )
            .await?,
        })
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        aggregate::count_where(
            &self.pool,
            "employees",
            &Filter::new().eq("status", EmploymentStatus::Active),
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::{new_id, testing};
    use zarmind_core::{EmploymentType, Money};

    pub(crate) fn employee(branch_id: &str, code: &str, department: Option<&str>) -> Employee {
        let now = Utc::now();
        Employee {
            id: new_id(),
            employee_code: code.to_string(),
            first_name: "Nima".to_string(),
            last_name: "Ahmadi".to_string(),
            phone: "09350000000".to_string(),
            email: None,
            national_id: None,
            position: Some("Sales".to_string()),
            department: department.map(str::to_string),
            employment_type: EmploymentType::FullTime,
            hire_date: NaiveDate::from_ymd_opt(2023, 3, 21).unwrap(),
            termination_date: None,
            status: EmploymentStatus::Active,
            branch_id: branch_id.to_string(),
            base_salary: Money::from_major(150_000.0),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_terminate_keeps_row_and_stamps_date() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let repo = db.employees();

        let e = repo.insert(&employee(&branch.id, "EMP-1", None)).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        repo.terminate(&e.id, day).await.unwrap();

        let e = repo.get(&e.id).await.unwrap();
        assert_eq!(e.status, EmploymentStatus::Terminated);
        assert_eq!(e.termination_date, Some(day));
        assert_eq!(db.branches().dependents(&branch.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counts_group_null_department_as_unassigned() {
        let db = testing::database().await;
        let branch = db.branches().insert(&testing::branch("BR-1")).await.unwrap();
        let repo = db.employees();

        repo.insert(&employee(&branch.id, "EMP-1", Some("Sales"))).await.unwrap();
        repo.insert(&employee(&branch.id, "EMP-2", Some("Sales"))).await.unwrap();
        repo.insert(&employee(&branch.id, "EMP-3", None)).await.unwrap();

        let counts = repo.counts().await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.by_department.get("Sales"), Some(&2));
        assert_eq!(counts.by_department.get(aggregate::UNASSIGNED), Some(&1));
        assert_eq!(counts.by_status.get("ACTIVE"), Some(&3));
        assert_eq!(counts.by_employment_type.get("FULL_TIME"), Some(&3));
        assert!(repo.code_exists("EMP-2").await.unwrap());
    }
}

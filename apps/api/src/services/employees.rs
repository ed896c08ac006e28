//! HR employees.
//!
//! Employees are never hard-deleted: removing one terminates them so that
//! payroll and attendance history stays attached.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::{check_email, clean, insert_with_code, merge, merge_opt, require_reference};
use crate::error::{ApiError, ApiResult};
use zarmind_core::codes::generate_code;
use zarmind_core::validation::{validate_name, validate_non_negative, validate_phone};
use zarmind_core::{
    Employee, EmployeePatch, EmployeeQuery, EmploymentStatus, NewEmployee, PagedResult,
};
use zarmind_db::{new_id, Database, EmployeeCounts};

/// `GET /hr/employees/summary`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_department: BTreeMap<String, i64>,
    pub by_employment_type: BTreeMap<String, i64>,
}

impl From<EmployeeCounts> for EmployeeSummary {
    fn from(counts: EmployeeCounts) -> Self {
        EmployeeSummary {
            total: counts.total,
            by_status: counts.by_status,
            by_department: counts.by_department,
            by_employment_type: counts.by_employment_type,
        }
    }
}

pub struct EmployeeService {
    db: Database,
}

impl EmployeeService {
    pub fn new(db: &Database) -> Self {
        EmployeeService { db: db.clone() }
    }

    pub async fn create(&self, input: NewEmployee) -> ApiResult<Employee> {
        validate_name("firstName", &input.first_name)?;
        validate_name("lastName", &input.last_name)?;
        validate_phone(&input.phone)?;
        check_email(input.email.as_deref())?;
        let base_salary = input.base_salary.unwrap_or_default();
        validate_non_negative("baseSalary", base_salary)?;

        require_reference(self.db.branches().exists(&input.branch_id).await?, "Branch")?;

        let repo = &self.db.employees();
        let supplied = clean(input.employee_code);
        if let Some(code) = supplied.as_deref() {
            if repo.code_exists(code).await? {
                return Err(ApiError::bad_request(format!(
                    "Employee with code {code} already exists"
                )));
            }
        }
        let national_id = clean(input.national_id);
        if let Some(nid) = national_id.as_deref() {
            if repo.national_id_taken(nid, None).await? {
                return Err(ApiError::bad_request(
                    "Employee with this national ID already exists",
                ));
            }
        }

        let now = Utc::now();
        let template = Employee {
            id: new_id(),
            employee_code: String::new(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            phone: input.phone.trim().to_string(),
            email: clean(input.email),
            national_id,
            position: clean(input.position),
            department: clean(input.department),
            employment_type: input.employment_type.unwrap_or_default(),
            hire_date: input.hire_date.unwrap_or_else(|| now.date_naive()),
            termination_date: None,
            status: input.status.unwrap_or_default(),
            branch_id: input.branch_id,
            base_salary,
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };

        let employee = insert_with_code(
            "employee_code",
            supplied,
            || generate_code("EMP"),
            move |employee_code| {
                let employee = Employee {
                    employee_code,
                    ..template.clone()
                };
                async move { repo.insert(&employee).await }
            },
        )
        .await?;
        info!(id = %employee.id, code = %employee.employee_code, "Employee created");
        Ok(employee)
    }

    pub async fn list(&self, query: &EmployeeQuery) -> ApiResult<PagedResult<Employee>> {
        Ok(self.db.employees().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Employee> {
        Ok(self.db.employees().get(id).await?)
    }

    /// Administrative edit; allowed in every status, terminal ones included.
    pub async fn update(&self, id: &str, patch: EmployeePatch) -> ApiResult<Employee> {
        let repo = self.db.employees();
        let mut employee = repo.get(id).await?;

        if let Some(name) = patch.first_name.as_deref() {
            validate_name("firstName", name)?;
        }
        if let Some(name) = patch.last_name.as_deref() {
            validate_name("lastName", name)?;
        }
        if let Some(phone) = patch.phone.as_deref() {
            validate_phone(phone)?;
        }
        check_email(patch.email.as_deref())?;
        if let Some(salary) = patch.base_salary {
            validate_non_negative("baseSalary", salary)?;
        }
        if let Some(branch_id) = patch.branch_id.as_deref() {
            require_reference(self.db.branches().exists(branch_id).await?, "Branch")?;
        }
        if let Some(nid) = patch.national_id.as_deref().filter(|n| !n.trim().is_empty()) {
            if repo.national_id_taken(nid.trim(), Some(id)).await? {
                return Err(ApiError::bad_request(
                    "Employee with this national ID already exists",
                ));
            }
        }

        merge(&mut employee.first_name, patch.first_name.map(|n| n.trim().to_string()));
        merge(&mut employee.last_name, patch.last_name.map(|n| n.trim().to_string()));
        merge(&mut employee.phone, patch.phone.map(|p| p.trim().to_string()));
        merge_opt(&mut employee.email, patch.email);
        merge_opt(&mut employee.national_id, clean(patch.national_id));
        merge_opt(&mut employee.position, patch.position);
        merge_opt(&mut employee.department, patch.department);
        merge(&mut employee.employment_type, patch.employment_type);
        merge(&mut employee.hire_date, patch.hire_date);
        merge_opt(&mut employee.termination_date, patch.termination_date);
        merge(&mut employee.status, patch.status);
        merge(&mut employee.branch_id, patch.branch_id);
        merge(&mut employee.base_salary, patch.base_salary);
        merge_opt(&mut employee.notes, patch.notes);

        employee.updated_at = Utc::now();
        repo.update(&employee).await?;
        Ok(employee)
    }

    /// Terminates the employee as of today.
    pub async fn remove(&self, id: &str) -> ApiResult<Employee> {
        let repo = self.db.employees();
        let employee = repo.get(id).await?;
        if employee.status != EmploymentStatus::Terminated {
            repo.terminate(id, Utc::now().date_naive()).await?;
            info!(id = %id, "Employee terminated");
        }
        Ok(repo.get(id).await?)
    }

    pub async fn summary(&self) -> ApiResult<EmployeeSummary> {
        Ok(self.db.employees().counts().await?.into())
    }
}

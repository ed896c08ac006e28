//! Branches, customers, suppliers, workshops, employees and users.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{
    CustomerStatus, CustomerType, EmploymentStatus, EmploymentType, SupplierStatus, UserRole,
    UserStatus, WorkshopStatus,
};
use crate::money::Money;
use crate::paging::ListParams;

// =============================================================================
// Branch
// =============================================================================

/// A physical shop or warehouse. Stock, staff and purchases belong to one.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Branch {
    pub id: String,
    /// Business code, e.g. `BR-250314-M7Q2K9XZ`.
    pub code: String,
    pub name: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// The main branch can never be deleted.
    pub is_main_branch: bool,
    /// Soft-delete flag.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBranch {
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_main_branch: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub is_active: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Customer
// =============================================================================

/// A CRM customer, individual or business.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    /// `CUST-YYMMDD-HHMMSS-XXXX` unless supplied.
    pub code: String,
    #[serde(rename = "type")]
    pub customer_type: CustomerType,
    pub status: CustomerStatus,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub credit_limit: Money,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub current_balance: Money,
    pub loyalty_points: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub customer_type: Option<CustomerType>,
    pub status: Option<CustomerStatus>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[serde(default, with = "crate::money::major::option")]
    pub credit_limit: Option<Money>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    #[serde(flatten)]
    pub list: ListParams,
    #[serde(rename = "type")]
    pub customer_type: Option<CustomerType>,
    pub status: Option<CustomerStatus>,
    /// Substring match.
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    #[serde(rename = "type")]
    pub customer_type: Option<CustomerType>,
    pub status: Option<CustomerStatus>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[serde(default, with = "crate::money::major::option")]
    pub credit_limit: Option<Money>,
    pub loyalty_points: Option<i64>,
    pub notes: Option<String>,
}

// =============================================================================
// Supplier
// =============================================================================

/// A vendor of gold, stones or goods. Counterparty of accounts payable.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub code: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub payment_terms: Option<String>,
    /// 1..=5 when rated.
    pub rating: Option<i64>,
    pub status: SupplierStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub payment_terms: Option<String>,
    pub rating: Option<i64>,
    pub status: Option<SupplierStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub status: Option<SupplierStatus>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdate {
    #[serde(default)]
    pub rating: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub payment_terms: Option<String>,
    pub rating: Option<i64>,
    pub status: Option<SupplierStatus>,
    pub notes: Option<String>,
}

// =============================================================================
// Workshop
// =============================================================================

/// An external goldsmith workshop that manufactures or repairs items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Workshop {
    pub id: String,
    pub code: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub status: WorkshopStatus,
    pub rating: Option<i64>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkshop {
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub status: Option<WorkshopStatus>,
    pub rating: Option<i64>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub status: Option<WorkshopStatus>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopPatch {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub status: Option<WorkshopStatus>,
    pub rating: Option<i64>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Employee
// =============================================================================

/// Staff member attached to a branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub employment_type: EmploymentType,
    #[ts(as = "String")]
    pub hire_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub termination_date: Option<NaiveDate>,
    pub status: EmploymentStatus,
    pub branch_id: String,
    #[serde(with = "crate::money::major")]
    #[ts(type = "number")]
    pub base_salary: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub employee_code: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub hire_date: Option<NaiveDate>,
    pub status: Option<EmploymentStatus>,
    #[serde(default)]
    pub branch_id: String,
    #[serde(default, with = "crate::money::major::option")]
    pub base_salary: Option<Money>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub status: Option<EmploymentStatus>,
    pub employment_type: Option<EmploymentType>,
    /// Substring match.
    pub department: Option<String>,
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub hire_date: Option<NaiveDate>,
    pub termination_date: Option<NaiveDate>,
    pub status: Option<EmploymentStatus>,
    pub branch_id: Option<String>,
    #[serde(default, with = "crate::money::major::option")]
    pub base_salary: Option<Money>,
    pub notes: Option<String>,
}

// =============================================================================
// User
// =============================================================================

/// A login account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub branch_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub branch_id: Option<String>,
    /// Plain text; hashed by the service before it reaches the database.
    pub password: Option<String>,
}

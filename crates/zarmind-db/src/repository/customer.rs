//! # Customer Repository
//!
//! CRM customers. A customer with receivables is never hard-deleted; the
//! caller flips it to `INACTIVE` instead.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate;
use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::{
    Customer, CustomerQuery, CustomerStatus, PagedResult, SortOrder, DEFAULT_PAGE_LIMIT,
};

pub const CUSTOMERS: Resource = Resource {
    entity: "Customer",
    table: "customers",
    columns: "*",
    search_columns: &[
        "code",
        "phone",
        "email",
        "business_name",
        "first_name",
        "last_name",
    ],
    sort_columns: &[
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
        ("firstName", "first_name"),
        ("businessName", "business_name"),
        ("code", "code"),
    ],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn list(&self, q: &CustomerQuery) -> DbResult<PagedResult<Customer>> {
        let filter = Filter::new()
            .eq_opt("customer_type", q.customer_type)
            .eq_opt("status", q.status)
            .contains_opt("city", q.city.as_deref());
        query::paginate(&self.pool, &CUSTOMERS, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        query::fetch_optional(&self.pool, &CUSTOMERS, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(CUSTOMERS.entity, id))
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    pub async fn insert(&self, c: &Customer) -> DbResult<Customer> {
        debug!(code = %c.code, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, code, customer_type, status, first_name, last_name, business_name,
                phone, email, national_id, address, city,
                credit_limit, current_balance, loyalty_points, notes,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16,
                ?17, ?18
            )
            "#,
        )
        .bind(&c.id)
        .bind(&c.code)
        .bind(c.customer_type)
        .bind(c.status)
        .bind(&c.first_name)
        .bind(&c.last_name)
        .bind(&c.business_name)
        .bind(&c.phone)
        .bind(&c.email)
        .bind(&c.national_id)
        .bind(&c.address)
        .bind(&c.city)
        .bind(c.credit_limit)
        .bind(c.current_balance)
        .bind(c.loyalty_points)
        .bind(&c.notes)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(c.clone())
    }

    pub async fn update(&self, c: &Customer) -> DbResult<()> {
        debug!(id = %c.id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                customer_type = ?2, status = ?3, first_name = ?4, last_name = ?5,
                business_name = ?6, phone = ?7, email = ?8, national_id = ?9,
                address = ?10, city = ?11, credit_limit = ?12, current_balance = ?13,
                loyalty_points = ?14, notes = ?15, updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(&c.id)
        .bind(c.customer_type)
        .bind(c.status)
        .bind(&c.first_name)
        .bind(&c.last_name)
        .bind(&c.business_name)
        .bind(&c.phone)
        .bind(&c.email)
        .bind(&c.national_id)
        .bind(&c.address)
        .bind(&c.city)
        .bind(c.credit_limit)
        .bind(c.current_balance)
        .bind(c.loyalty_points)
        .bind(&c.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(CUSTOMERS.entity, &c.id));
        }
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: CustomerStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting customer status");

        let result = sqlx::query("UPDATE customers SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(CUSTOMERS.entity, id));
        }
        Ok(())
    }

    /// Receivables owed by this customer.
    pub async fn dependents(&self, id: &str) -> DbResult<i64> {
        aggregate::count_where(
            &self.pool,
            "accounts_receivable",
            &Filter::new().eq("customer_id", id),
        )
        .await
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        aggregate::count_where(
            &self.pool,
            "customers",
            &Filter::new().eq("status", CustomerStatus::Active),
        )
        .await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(CUSTOMERS.entity, id));
        }
        Ok(())
    }
}

//! # Supplier Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate;
use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::{
    PagedResult, SortOrder, Supplier, SupplierQuery, SupplierStatus, DEFAULT_PAGE_LIMIT,
};

pub const SUPPLIERS: Resource = Resource {
    entity: "Supplier",
    table: "suppliers",
    columns: "*",
    search_columns: &["code", "name", "contact_person", "phone", "email"],
    sort_columns: &[
        ("createdAt", "created_at"),
        ("name", "name"),
        ("code", "code"),
        ("rating", "rating"),
    ],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn list(&self, q: &SupplierQuery) -> DbResult<PagedResult<Supplier>> {
        let filter = Filter::new()
            .eq_opt("status", q.status)
            .contains_opt("city", q.city.as_deref());
        query::paginate(&self.pool, &SUPPLIERS, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        query::fetch_optional(&self.pool, &SUPPLIERS, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Supplier> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(SUPPLIERS.entity, id))
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    pub async fn insert(&self, s: &Supplier) -> DbResult<Supplier> {
        debug!(code = %s.code, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, code, name, contact_person, phone, email, address, city,
                payment_terms, rating, status, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&s.id)
        .bind(&s.code)
        .bind(&s.name)
        .bind(&s.contact_person)
        .bind(&s.phone)
        .bind(&s.email)
        .bind(&s.address)
        .bind(&s.city)
        .bind(&s.payment_terms)
        .bind(s.rating)
        .bind(s.status)
        .bind(&s.notes)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(s.clone())
    }

    /// Writes every mutable column, including rating and notes.
    pub async fn update(&self, s: &Supplier) -> DbResult<()> {
        debug!(id = %s.id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?2, contact_person = ?3, phone = ?4, email = ?5, address = ?6,
                city = ?7, payment_terms = ?8, rating = ?9, status = ?10, notes = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&s.id)
        .bind(&s.name)
        .bind(&s.contact_person)
        .bind(&s.phone)
        .bind(&s.email)
        .bind(&s.address)
        .bind(&s.city)
        .bind(&s.payment_terms)
        .bind(s.rating)
        .bind(s.status)
        .bind(&s.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(SUPPLIERS.entity, &s.id));
        }
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: SupplierStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting supplier status");

        let result = sqlx::query("UPDATE suppliers SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(SUPPLIERS.entity, id));
        }
        Ok(())
    }

    /// Payables and purchase orders referencing the supplier.
    pub async fn dependents(&self, id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM accounts_payable WHERE supplier_id = ?1)
              + (SELECT COUNT(*) FROM purchases WHERE supplier_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        aggregate::count_where(
            &self.pool,
            "suppliers",
            &Filter::new().eq("status", SupplierStatus::Active),
        )
        .await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(SUPPLIERS.entity, id));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::{new_id, testing};

    pub(crate) fn supplier(code: &str) -> Supplier {
        let now = Utc::now();
        Supplier {
            id: new_id(),
            code: code.to_string(),
            name: format!("Gold House {code}"),
            contact_person: Some("Hassan".to_string()),
            phone: Some("02188776655".to_string()),
            email: None,
            address: None,
            city: Some("Isfahan".to_string()),
            payment_terms: Some("NET30".to_string()),
            rating: None,
            status: SupplierStatus::Active,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_update_rating_and_city_filter() {
        let db = testing::database().await;
        let repo = db.suppliers();

        let mut s = repo.insert(&supplier("SUPP-1")).await.unwrap();
        s.rating = Some(4);
        repo.update(&s).await.unwrap();
        assert_eq!(repo.get(&s.id).await.unwrap().rating, Some(4));

        let q = SupplierQuery {
            city: Some("isfa".to_string()),
            ..SupplierQuery::default()
        };
        assert_eq!(repo.list(&q).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_rating_out_of_range_violates_check() {
        let db = testing::database().await;
        let repo = db.suppliers();

        let mut s = supplier("SUPP-1");
        s.rating = Some(9);
        assert!(matches!(
            repo.insert(&s).await,
            Err(DbError::CheckViolation { .. })
        ));
    }
}

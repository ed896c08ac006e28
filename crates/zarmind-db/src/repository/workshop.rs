//! # Workshop Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate;
use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::{
    PagedResult, SortOrder, Workshop, WorkshopQuery, WorkshopStatus, DEFAULT_PAGE_LIMIT,
};

pub const WORKSHOPS: Resource = Resource {
    entity: "Workshop",
    table: "workshops",
    columns: "*",
    search_columns: &["code", "name", "contact_person", "phone"],
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
pub struct WorkshopRepository {
    pool: SqlitePool,
}

impl WorkshopRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WorkshopRepository { pool }
    }

    pub async fn list(&self, q: &WorkshopQuery) -> DbResult<PagedResult<Workshop>> {
        let filter = Filter::new()
            .eq_opt("status", q.status)
            .contains_opt("city", q.city.as_deref());
        query::paginate(&self.pool, &WORKSHOPS, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Workshop>> {
        query::fetch_optional(&self.pool, &WORKSHOPS, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Workshop> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(WORKSHOPS.entity, id))
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    pub async fn code_exists(&self, code: &str) -> DbResult<bool> {
        let found = query::fetch_optional::<Workshop>(
            &self.pool,
            &WORKSHOPS,
            &Filter::new().eq("code", code),
        )
        .await?;
        Ok(found.is_some())
    }

    pub async fn insert(&self, w: &Workshop) -> DbResult<Workshop> {
        debug!(code = %w.code, "Inserting workshop");

        sqlx::query(
            r#"
            INSERT INTO workshops (
                id, code, name, contact_person, phone, email, city, status,
                rating, payment_terms, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&w.id)
        .bind(&w.code)
        .bind(&w.name)
        .bind(&w.contact_person)
        .bind(&w.phone)
        .bind(&w.email)
        .bind(&w.city)
        .bind(w.status)
        .bind(w.rating)
        .bind(&w.payment_terms)
        .bind(&w.notes)
        .bind(w.created_at)
        .bind(w.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(w.clone())
    }

    pub async fn update(&self, w: &Workshop) -> DbResult<()> {
        debug!(id = %w.id, "Updating workshop");

        let result = sqlx::query(
            r#"
            UPDATE workshops SET
                name = ?2, contact_person = ?3, phone = ?4, email = ?5, city = ?6,
                status = ?7, rating = ?8, payment_terms = ?9, notes = ?10, updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&w.id)
        .bind(&w.name)
        .bind(&w.contact_person)
        .bind(&w.phone)
        .bind(&w.email)
        .bind(&w.city)
        .bind(w.status)
        .bind(w.rating)
        .bind(&w.payment_terms)
        .bind(&w.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(WORKSHOPS.entity, &w.id));
        }
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: WorkshopStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting workshop status");

        let result = sqlx::query("UPDATE workshops SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(WORKSHOPS.entity, id));
        }
        Ok(())
    }

    /// Items made by or currently at this workshop, plus its work orders.
    pub async fn dependents(&self, id: &str) -> DbResult<i64> {
        let scope = Filter::new().eq("workshop_id", id);
        let products = aggregate::count_where(&self.pool, "products", &scope).await?;
        let orders = aggregate::count_where(&self.pool, "work_orders", &scope).await?;
        Ok(products + orders)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting workshop");

        let result = sqlx::query("DELETE FROM workshops WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(WORKSHOPS.entity, id));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::{new_id, testing};

    pub(crate) fn workshop(code: &str) -> Workshop {
        let now = Utc::now();
        Workshop {
            id: new_id(),
            code: code.to_string(),
            name: "Golden Hands".to_string(),
            contact_person: None,
            phone: Some("02155443322".to_string()),
            email: None,
            city: Some("Tabriz".to_string()),
            status: WorkshopStatus::Active,
            rating: Some(5),
            payment_terms: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_code_exists_and_status_filter() {
        let db = testing::database().await;
        let repo = db.workshops();

        let w = repo.insert(&workshop("WS-1")).await.unwrap();
        assert!(repo.code_exists("WS-1").await.unwrap());
        assert!(!repo.code_exists("WS-2").await.unwrap());

        repo.set_status(&w.id, WorkshopStatus::Suspended).await.unwrap();
        let q = WorkshopQuery {
            status: Some(WorkshopStatus::Active),
            ..WorkshopQuery::default()
        };
        assert_eq!(repo.list(&q).await.unwrap().total, 0);
    }
}

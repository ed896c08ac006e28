//! # Branch Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::paging::is_truthy;
use zarmind_core::{Branch, BranchQuery, PagedResult, SortOrder, DEFAULT_PAGE_LIMIT};

pub const BRANCHES: Resource = Resource {
    entity: "Branch",
    table: "branches",
    columns: "*",
    search_columns: &["code", "name", "city"],
    sort_columns: &[
        ("createdAt", "created_at"),
        ("name", "name"),
        ("code", "code"),
        ("city", "city"),
    ],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    pub async fn list(&self, q: &BranchQuery) -> DbResult<PagedResult<Branch>> {
        let filter = Filter::new().eq_opt(
            "is_active",
            q.is_active.as_deref().map(|raw| is_truthy(Some(raw))),
        );
        query::paginate(&self.pool, &BRANCHES, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Branch>> {
        query::fetch_optional(&self.pool, &BRANCHES, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Branch> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(BRANCHES.entity, id))
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    pub async fn insert(&self, branch: &Branch) -> DbResult<Branch> {
        debug!(code = %branch.code, "Inserting branch");

        sqlx::query(
            r#"
            INSERT INTO branches (
                id, code, name, city, address, phone,
                is_main_branch, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&branch.id)
        .bind(&branch.code)
        .bind(&branch.name)
        .bind(&branch.city)
        .bind(&branch.address)
        .bind(&branch.phone)
        .bind(branch.is_main_branch)
        .bind(branch.is_active)
        .bind(branch.created_at)
        .bind(branch.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(branch.clone())
    }

    pub async fn update(&self, branch: &Branch) -> DbResult<()> {
        debug!(id = %branch.id, "Updating branch");

        let result = sqlx::query(
            r#"
            UPDATE branches SET
                name = ?2, city = ?3, address = ?4, phone = ?5,
                is_main_branch = ?6, is_active = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&branch.id)
        .bind(&branch.name)
        .bind(&branch.city)
        .bind(&branch.address)
        .bind(&branch.phone)
        .bind(branch.is_main_branch)
        .bind(branch.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(BRANCHES.entity, &branch.id));
        }
        Ok(())
    }

    /// Soft delete / reactivate.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting branch active flag");

        let result = sqlx::query("UPDATE branches SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(BRANCHES.entity, id));
        }
        Ok(())
    }

    /// Users, employees, stock rows and purchases attached to the branch.
    pub async fn dependents(&self, id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE branch_id = ?1)
              + (SELECT COUNT(*) FROM employees WHERE branch_id = ?1)
              + (SELECT COUNT(*) FROM branch_inventory WHERE branch_id = ?1)
              + (SELECT COUNT(*) FROM purchases WHERE branch_id = ?1)
              + (SELECT COUNT(*) FROM cash_transactions WHERE branch_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting branch");

        let result = sqlx::query("DELETE FROM branches WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(BRANCHES.entity, id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

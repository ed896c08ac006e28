//! # Setting Repository
//!
//! Key/value settings, addressed by `key` rather than id.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use zarmind_core::{Setting, SettingCategory};

#[derive(Debug, Clone)]
pub struct SettingRepository {
    pool: SqlitePool,
}

impl SettingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingRepository { pool }
    }

    /// All settings, optionally one category, ordered by category then key.
    pub async fn list(
        &self,
        category: Option<SettingCategory>,
        include_private: bool,
    ) -> DbResult<Vec<Setting>> {
        let rows = sqlx::query_as::<_, Setting>(
            r#"
            SELECT * FROM settings
            WHERE (?1 IS NULL OR category = ?1)
              AND (?2 = 1 OR is_public = 1)
            ORDER BY category ASC, key ASC
            "#,
        )
        .bind(category)
        .bind(include_private)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_key(&self, key: &str) -> DbResult<Option<Setting>> {
        let row = sqlx::query_as::<_, Setting>("SELECT * FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get(&self, key: &str) -> DbResult<Setting> {
        self.get_by_key(key)
            .await?
            .ok_or_else(|| DbError::not_found("Setting", key))
    }

    pub async fn insert(&self, s: &Setting) -> DbResult<Setting> {
        debug!(key = %s.key, "Inserting setting");

        sqlx::query(
            r#"
            INSERT INTO settings (
                id, key, category, value, value_type, description, is_public,
                updated_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&s.id)
        .bind(&s.key)
        .bind(s.category)
        .bind(&s.value)
        .bind(s.value_type)
        .bind(&s.description)
        .bind(s.is_public)
        .bind(&s.updated_by)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(s.clone())
    }

    /// Replaces the raw value; `None` description keeps the current one.
    pub async fn update_value(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
        updated_by: Option<&str>,
    ) -> DbResult<()> {
        debug!(key = %key, "Updating setting");

        let result = sqlx::query(
            r#"
            UPDATE settings SET
                value = ?2,
                description = COALESCE(?3, description),
                updated_by = ?4,
                updated_at = ?5
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(updated_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Setting", key));
        }
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> DbResult<()> {
        debug!(key = %key, "Deleting setting");

        let result = sqlx::query("DELETE FROM settings WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Setting", key));
        }
        Ok(())
    }
}

//! # User Repository
//!
//! Login accounts. `password_hash` is read and written here but never
//! serialized out of the server.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::aggregate;
use crate::error::{DbError, DbResult};
use crate::query::{self, Filter, Resource};
use zarmind_core::{PagedResult, SortOrder, User, UserQuery, UserStatus, DEFAULT_PAGE_LIMIT};

pub const USERS: Resource = Resource {
    entity: "User",
    table: "users",
    columns: "*",
    search_columns: &["email", "username", "first_name", "last_name"],
    sort_columns: &[
        ("createdAt", "created_at"),
        ("email", "email"),
        ("username", "username"),
        ("lastLoginAt", "last_login_at"),
    ],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    default_limit: DEFAULT_PAGE_LIMIT,
};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn list(&self, q: &UserQuery) -> DbResult<PagedResult<User>> {
        let filter = Filter::new()
            .eq_opt("role", q.role)
            .eq_opt("status", q.status)
            .eq_opt("branch_id", q.branch_id.as_deref());
        query::paginate(&self.pool, &USERS, &filter, &q.list).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        query::fetch_optional(&self.pool, &USERS, &Filter::new().eq("id", id)).await
    }

    pub async fn get(&self, id: &str) -> DbResult<User> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(USERS.entity, id))
    }

    /// Looks a user up by email or username (case-insensitive).
    pub async fn find_by_login(&self, login: &str) -> DbResult<Option<User>> {
        let login = login.trim();
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER(?1) OR LOWER(username) = LOWER(?1) LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn insert(&self, u: &User) -> DbResult<User> {
        debug!(email = %u.email, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, username, password_hash, first_name, last_name, phone,
                role, status, branch_id, last_login_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&u.id)
        .bind(&u.email)
        .bind(&u.username)
        .bind(&u.password_hash)
        .bind(&u.first_name)
        .bind(&u.last_name)
        .bind(&u.phone)
        .bind(u.role)
        .bind(u.status)
        .bind(&u.branch_id)
        .bind(u.last_login_at)
        .bind(u.created_at)
        .bind(u.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(u.clone())
    }

    pub async fn update(&self, u: &User) -> DbResult<()> {
        debug!(id = %u.id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                password_hash = ?2, first_name = ?3, last_name = ?4, phone = ?5,
                role = ?6, status = ?7, branch_id = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&u.id)
        .bind(&u.password_hash)
        .bind(&u.first_name)
        .bind(&u.last_name)
        .bind(&u.phone)
        .bind(u.role)
        .bind(u.status)
        .bind(&u.branch_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(USERS.entity, &u.id));
        }
        Ok(())
    }

    pub async fn touch_login(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: UserStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting user status");

        let result = sqlx::query("UPDATE users SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(USERS.entity, id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        aggregate::count_where(&self.pool, "users", &Filter::new()).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::{new_id, testing};
    use zarmind_core::UserRole;

    pub(crate) fn user(email: &str, username: &str) -> User {
        let now = Utc::now();
        User {
            id: new_id(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            role: UserRole::Manager,
            status: UserStatus::Active,
            branch_id: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_by_email_or_username() {
        let db = testing::database().await;
        let repo = db.users();

        let u = repo.insert(&user("owner@zarmind.test", "owner")).await.unwrap();

        let by_email = repo.find_by_login("OWNER@zarmind.test").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(u.id.clone()));
        let by_name = repo.find_by_login(" owner ").await.unwrap();
        assert_eq!(by_name.map(|u| u.id), Some(u.id.clone()));
        assert!(repo.find_by_login("nobody").await.unwrap().is_none());

        repo.touch_login(&u.id).await.unwrap();
        assert!(repo.get(&u.id).await.unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = testing::database().await;
        let repo = db.users();

        repo.insert(&user("a@zarmind.test", "a")).await.unwrap();
        let err = repo.insert(&user("a@zarmind.test", "b")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }
}

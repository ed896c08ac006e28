//! Login accounts.

use chrono::Utc;
use tracing::info;

use super::{check_phone, clean, merge, merge_opt, require_reference};
use crate::auth::hash_password;
use crate::error::{ApiError, ApiResult};
use zarmind_core::validation::{validate_email, validate_name, validate_required};
use zarmind_core::{NewUser, PagedResult, User, UserPatch, UserQuery, UserStatus};
use zarmind_db::{new_id, Database};

const MIN_PASSWORD_LEN: usize = 8;

pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: &Database) -> Self {
        UserService { db: db.clone() }
    }

    /// Creates an account; email and username must be unique (409).
    pub async fn create(&self, input: NewUser) -> ApiResult<User> {
        validate_email(&input.email)?;
        validate_name("username", &input.username)?;
        check_password(&input.password)?;
        check_phone(input.phone.as_deref())?;
        let branch_id = clean(input.branch_id);
        if let Some(branch_id) = branch_id.as_deref() {
            require_reference(self.db.branches().exists(branch_id).await?, "Branch")?;
        }

        let repo = self.db.users();
        for login in [&input.email, &input.username] {
            if repo.find_by_login(login).await?.is_some() {
                return Err(ApiError::conflict("User with this email or username already exists"));
            }
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            email: input.email.trim().to_ascii_lowercase(),
            username: input.username.trim().to_string(),
            password_hash: hash_password(&input.password)?,
            first_name: clean(input.first_name),
            last_name: clean(input.last_name),
            phone: clean(input.phone),
            role: input.role.unwrap_or_default(),
            status: input.status.unwrap_or_default(),
            branch_id,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let user = repo.insert(&user).await?;
        info!(id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn list(&self, query: &UserQuery) -> ApiResult<PagedResult<User>> {
        Ok(self.db.users().list(query).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<User> {
        Ok(self.db.users().get(id).await?)
    }

    pub async fn update(&self, id: &str, patch: UserPatch) -> ApiResult<User> {
        let repo = self.db.users();
        let mut user = repo.get(id).await?;

        check_phone(patch.phone.as_deref())?;
        if let Some(branch_id) = patch.branch_id.as_deref() {
            require_reference(self.db.branches().exists(branch_id).await?, "Branch")?;
        }
        if let Some(password) = patch.password.as_deref() {
            check_password(password)?;
            user.password_hash = hash_password(password)?;
        }

        merge_opt(&mut user.first_name, patch.first_name);
        merge_opt(&mut user.last_name, patch.last_name);
        merge_opt(&mut user.phone, patch.phone);
        merge(&mut user.role, patch.role);
        merge(&mut user.status, patch.status);
        merge_opt(&mut user.branch_id, patch.branch_id);

        user.updated_at = Utc::now();
        repo.update(&user).await?;
        Ok(user)
    }

    /// Accounts are only ever deactivated.
    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        let repo = self.db.users();
        repo.get(id).await?;
        repo.set_status(id, UserStatus::Inactive).await?;
        info!(id = %id, "User deactivated");
        Ok(())
    }
}

fn check_password(password: &str) -> ApiResult<()> {
    validate_required("password", password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::error::ErrorCode;
    use crate::services::testing;
    use zarmind_core::UserRole;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password: "s3cret-pass".to_string(),
            role: Some(UserRole::SalesStaff),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let db = testing::database().await;
        let user = UserService::new(&db)
            .create(new_user("Sales@Zarmind.test", "sales"))
            .await
            .unwrap();
        assert_eq!(user.email, "sales@zarmind.test");
        assert_ne!(user.password_hash, "s3cret-pass");
        assert!(verify_password("s3cret-pass", &user.password_hash));
    }

    #[tokio::test]
    async fn test_duplicate_login_is_conflict() {
        let db = testing::database().await;
        let service = UserService::new(&db);
        service.create(new_user("a@zarmind.test", "alpha")).await.unwrap();

        let err = service
            .create(new_user("b@zarmind.test", "ALPHA"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let db = testing::database().await;
        let err = UserService::new(&db)
            .create(NewUser {
                password: "short".to_string(),
                ..new_user("c@zarmind.test", "charlie")
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_remove_deactivates() {
        let db = testing::database().await;
        let service = UserService::new(&db);
        let user = service.create(new_user("d@zarmind.test", "delta")).await.unwrap();

        service.remove(&user.id).await.unwrap();
        assert_eq!(service.get(&user.id).await.unwrap().status, UserStatus::Inactive);
    }
}

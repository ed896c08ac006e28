//! Login, profile and the first administrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::users::UserService;
use crate::auth::{verify_password, AuthUser, IssuedToken, JwtManager};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use zarmind_core::{NewUser, User, UserRole};
use zarmind_db::Database;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl LoginRequest {
    fn login(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// A successful login: the response body plus the token for the cookie.
pub struct Session {
    pub token: IssuedToken,
    pub user: User,
}

impl Session {
    pub fn response(self) -> LoginResponse {
        LoginResponse {
            access_token: self.token.token,
            token_type: "Bearer",
            expires_at: self.token.expires_at,
            user: self.user,
        }
    }
}

pub struct AuthService<'a> {
    db: &'a Database,
    jwt: &'a JwtManager,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a Database, jwt: &'a JwtManager) -> Self {
        AuthService { db, jwt }
    }

    /// Checks credentials first, then account status.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<Session> {
        let invalid = || ApiError::unauthorized("Invalid credentials");

        let login = request.login().ok_or_else(invalid)?;
        let user = self
            .db
            .users()
            .find_by_login(login)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &user.password_hash) {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(invalid());
        }
        if !user.is_active() {
            return Err(ApiError::forbidden("User account is not active"));
        }

        self.db.users().touch_login(&user.id).await?;
        let user = self.db.users().get(&user.id).await?;
        let token = self.jwt.issue(&user, request.remember_me)?;

        info!(user_id = %user.id, remember = request.remember_me, "User logged in");
        Ok(Session { token, user })
    }

    pub async fn me(&self, caller: &AuthUser) -> ApiResult<User> {
        Ok(self.db.users().get(&caller.id).await?)
    }
}

/// Creates the configured administrator when the user table is empty.
pub async fn bootstrap_admin(db: &Database, config: &ApiConfig) -> ApiResult<Option<User>> {
    let (Some(email), Some(password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(None);
    };
    if db.users().count().await? > 0 {
        return Ok(None);
    }

    let username = email.split('@').next().unwrap_or(email).to_string();
    let admin = UserService::new(db)
        .create(NewUser {
            email: email.to_string(),
            username,
            password: password.to_string(),
            role: Some(UserRole::SuperAdmin),
            ..NewUser::default()
        })
        .await?;
    info!(email = %admin.email, "Bootstrap administrator created");
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing;
    use zarmind_core::{UserPatch, UserStatus};

    fn config_with_admin() -> ApiConfig {
        ApiConfig {
            bootstrap_admin_email: Some("root@zarmind.test".to_string()),
            bootstrap_admin_password: Some("change-me-now".to_string()),
            ..ApiConfig::for_tests()
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: password.to_string(),
            ..LoginRequest::default()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_runs_once() {
        let db = testing::database().await;
        let config = config_with_admin();

        let admin = bootstrap_admin(&db, &config).await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::SuperAdmin);
        assert_eq!(admin.username, "root");
        assert!(bootstrap_admin(&db, &config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_flow() {
        let db = testing::database().await;
        let config = config_with_admin();
        let jwt = JwtManager::from_config(&config);
        bootstrap_admin(&db, &config).await.unwrap();
        let service = AuthService::new(&db, &jwt);

        let session = service
            .login(&login("root@zarmind.test", "change-me-now"))
            .await
            .unwrap();
        assert!(session.user.last_login_at.is_some());
        let claims = jwt.validate(&session.token.token).unwrap();
        assert_eq!(claims.sub, session.user.id);

        let by_username = LoginRequest {
            email: None,
            username: Some("root".to_string()),
            password: "change-me-now".to_string(),
            remember_me: true,
        };
        let response = service.login(&by_username).await.unwrap().response();
        assert_eq!(response.token_type, "Bearer");
    }

    #[tokio::test]
    async fn test_login_rejections() {
        let db = testing::database().await;
        let config = config_with_admin();
        let jwt = JwtManager::from_config(&config);
        let admin = bootstrap_admin(&db, &config).await.unwrap().unwrap();
        let service = AuthService::new(&db, &jwt);

        let err = service
            .login(&login("root@zarmind.test", "wrong-password"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, "Invalid credentials");

        let err = service
            .login(&login("nobody@zarmind.test", "change-me-now"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        UserService::new(&db)
            .update(
                &admin.id,
                UserPatch {
                    status: Some(UserStatus::Suspended),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();
        let err = service
            .login(&login("root@zarmind.test", "change-me-now"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.message, "User account is not active");
    }
}

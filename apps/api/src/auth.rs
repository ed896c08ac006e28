//! JWT authentication and role guard.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Authorization: Bearer <jwt>      (or Cookie: access_token=<jwt>)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  require_roles (route layer, carries the route's allowed roles)        │
//! │       ├── no / invalid token      → 401                                │
//! │       ├── status != ACTIVE        → 403 "User account is not active"   │
//! │       ├── role not in the set     → 403 "Insufficient role ..."        │
//! │       └── ok: AuthUser inserted into request extensions                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  handler(Extension(user): Extension<AuthUser>, ...)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use zarmind_core::{User, UserRole, UserStatus};

// =============================================================================
// Role Sets
// =============================================================================

/// Any authenticated, active user.
pub const ANY_ROLE: &[UserRole] = &[];

pub const ADMINS: &[UserRole] = &[UserRole::SuperAdmin, UserRole::Admin];

pub const MANAGERS: &[UserRole] = &[UserRole::SuperAdmin, UserRole::Admin, UserRole::Manager];

pub const FINANCE: &[UserRole] = &[
    UserRole::SuperAdmin,
    UserRole::Admin,
    UserRole::Manager,
    UserRole::Accountant,
];

pub const SALES: &[UserRole] = &[
    UserRole::SuperAdmin,
    UserRole::Admin,
    UserRole::Manager,
    UserRole::SalesStaff,
];

/// Staff who may record cash book movements.
pub const CASHIERS: &[UserRole] = &[
    UserRole::SuperAdmin,
    UserRole::Admin,
    UserRole::Manager,
    UserRole::Accountant,
    UserRole::SalesStaff,
];

pub const WAREHOUSE: &[UserRole] = &[
    UserRole::SuperAdmin,
    UserRole::Admin,
    UserRole::Manager,
    UserRole::WarehouseStaff,
];

// =============================================================================
// Claims
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    pub role: UserRole,

    pub status: UserStatus,

    pub branch_id: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// The authenticated identity, passed explicitly to services.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub branch_id: Option<String>,
}

impl AuthUser {
    /// Checks account status, then the role set (empty means any role).
    pub fn authorize(&self, roles: &[UserRole]) -> ApiResult<()> {
        if self.status != UserStatus::Active {
            return Err(ApiError::forbidden("User account is not active"));
        }
        if !roles.is_empty() && !roles.contains(&self.role) {
            return Err(ApiError::forbidden("Insufficient role to access this resource"));
        }
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        ADMINS.contains(&self.role)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
            status: claims.status,
            branch_id: claims.branch_id,
        }
    }
}

// =============================================================================
// Token Manager
// =============================================================================

/// A signed access token and when it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub lifetime: Duration,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    access_lifetime: Duration,
    remember_lifetime: Duration,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtManager {
    pub fn new(secret: impl Into<String>, access_lifetime: Duration, remember_lifetime: Duration) -> Self {
        JwtManager {
            secret: secret.into(),
            access_lifetime,
            remember_lifetime,
            issuer: None,
            audience: None,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        JwtManager {
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            ..JwtManager::new(
                config.jwt_secret.clone(),
                config.jwt_access_lifetime,
                config.jwt_remember_lifetime,
            )
        }
    }

    /// Signs an HS256 access token for `user`.
    pub fn issue(&self, user: &User, remember: bool) -> ApiResult<IssuedToken> {
        let lifetime = if remember {
            self.remember_lifetime
        } else {
            self.access_lifetime
        };
        let now = Utc::now().timestamp();
        let exp = now.saturating_add(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX / 2));

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            status: user.status,
            branch_id: user.branch_id.clone(),
            iat: now,
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))?;

        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| ApiError::internal("Token expiry out of range"))?;

        Ok(IssuedToken {
            token,
            expires_at,
            lifetime,
        })
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Token Extraction
// =============================================================================

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reads the named cookie from a `Cookie` header.
pub fn extract_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// Bearer header first, then the auth cookie when cookies are enabled.
pub fn token_from_headers<'a>(headers: &'a HeaderMap, config: &ApiConfig) -> Option<&'a str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token);
    if bearer.is_some() || !config.auth_use_cookies {
        return bearer;
    }
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|c| extract_cookie(c, &config.jwt_cookie_name))
}

/// Resolves the caller from request headers.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthUser> {
    let token = token_from_headers(headers, &state.config)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    Ok(state.jwt.validate(token)?.into())
}

/// `Set-Cookie` value carrying the access token.
pub fn auth_cookie(config: &ApiConfig, token: &IssuedToken) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        config.jwt_cookie_name,
        token.token,
        token.lifetime.as_secs()
    );
    if config.jwt_cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the access token.
pub fn clear_cookie(config: &ApiConfig) -> String {
    format!(
        "{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0",
        config.jwt_cookie_name
    )
}

// =============================================================================
// Role Guard
// =============================================================================

/// State of one guarded route: the app plus the roles it admits.
#[derive(Clone)]
pub struct RoleGuard {
    state: Arc<AppState>,
    roles: &'static [UserRole],
}

impl RoleGuard {
    pub fn new(state: &Arc<AppState>, roles: &'static [UserRole]) -> Self {
        RoleGuard {
            state: state.clone(),
            roles,
        }
    }
}

/// Route layer admitting the given roles (empty = any authenticated user).
///
/// ```rust,ignore
/// Router::new()
///     .route("/{id}", get(get_one).route_layer(guard!(state, ANY_ROLE)))
///     .route("/{id}", delete(remove).route_layer(guard!(state, ADMINS)))
/// ```
macro_rules! guard {
    ($state:expr, $roles:expr) => {
        axum::middleware::from_fn_with_state(
            $crate::auth::RoleGuard::new(&$state, $roles),
            $crate::auth::require_roles,
        )
    };
}
pub(crate) use guard;

pub async fn require_roles(
    State(guard): State<RoleGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&guard.state, req.headers())?;
    user.authorize(guard.roles)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: UserRole, status: UserStatus) -> User {
        let now = Utc::now();
        User {
            id: "user-1".to_string(),
            email: "owner@zarmind.test".to_string(),
            username: "owner".to_string(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            phone: None,
            role,
            status,
            branch_id: Some("branch-1".to_string()),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn manager() -> JwtManager {
        JwtManager::new("test-secret", Duration::from_secs(900), Duration::from_secs(86_400))
    }

    #[test]
    fn test_jwt_roundtrip() {
        let jwt = manager();
        let issued = jwt.issue(&user(UserRole::Manager, UserStatus::Active), false).unwrap();
        let claims = jwt.validate(&issued.token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, UserRole::Manager);
        assert_eq!(claims.branch_id.as_deref(), Some("branch-1"));
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_remember_uses_long_lifetime() {
        let issued = manager()
            .issue(&user(UserRole::Viewer, UserStatus::Active), true)
            .unwrap();
        assert_eq!(issued.lifetime, Duration::from_secs(86_400));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issued = manager()
            .issue(&user(UserRole::Admin, UserStatus::Active), false)
            .unwrap();
        let other = JwtManager::new("other", Duration::from_secs(60), Duration::from_secs(60));
        let err = other.validate(&issued.token).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_authorize_checks_status_then_role() {
        let viewer: AuthUser = Claims {
            sub: "u".to_string(),
            email: "v@zarmind.test".to_string(),
            role: UserRole::Viewer,
            status: UserStatus::Active,
            branch_id: None,
            iat: 0,
            exp: 0,
            iss: None,
            aud: None,
        }
        .into();
        assert!(viewer.authorize(ANY_ROLE).is_ok());
        let err = viewer.authorize(ADMINS).unwrap_err();
        assert_eq!(err.message, "Insufficient role to access this resource");

        let suspended = AuthUser {
            status: UserStatus::Suspended,
            role: UserRole::Admin,
            ..viewer
        };
        let err = suspended.authorize(ADMINS).unwrap_err();
        assert_eq!(err.message, "User account is not active");
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[test]
    fn test_token_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(
            extract_cookie("theme=dark; access_token=xyz", "access_token"),
            Some("xyz")
        );
        assert_eq!(extract_cookie("theme=dark", "access_token"), None);
    }
}

//! API configuration module.
//!
//! Configuration is loaded once from environment variables with fallback to
//! defaults, then shared read-only through [`crate::AppState`].

use std::env;
use std::time::Duration;

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(15 * 60);

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// Redis connection string (optional; caching is off without it)
    pub redis_url: Option<String>,

    /// Prefix prepended to every cache key
    pub redis_key_prefix: String,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// Access token lifetime
    pub jwt_access_lifetime: Duration,

    /// Access token lifetime when the user asked to be remembered
    pub jwt_remember_lifetime: Duration,

    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Also accept and issue the token as an httpOnly cookie
    pub auth_use_cookies: bool,
    pub jwt_cookie_name: String,
    pub jwt_cookie_secure: bool,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// TTL of cached dashboard and aging reports
    pub dashboard_cache_ttl_secs: u64,

    /// First administrator, created at startup when there are no users
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: parse_var("HTTP_PORT", "3000")?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./zarmind.db".to_string()),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,

            redis_url: optional_var("REDIS_URL"),

            redis_key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "zarmind:cache:".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // In production, this MUST be set via environment variable
                "zarmind-dev-secret-change-in-production".to_string()
            }),

            jwt_access_lifetime: parse_duration(
                &env::var("JWT_ACCESS_EXPIRES_IN").unwrap_or_else(|_| "15m".to_string()),
            ),

            jwt_remember_lifetime: parse_duration(
                &env::var("JWT_ACCESS_EXPIRES_REMEMBER").unwrap_or_else(|_| "7d".to_string()),
            ),

            jwt_issuer: optional_var("JWT_ISSUER"),
            jwt_audience: optional_var("JWT_AUDIENCE"),

            auth_use_cookies: parse_flag("AUTH_USE_COOKIES"),
            jwt_cookie_name: env::var("JWT_COOKIE_NAME")
                .unwrap_or_else(|_| "access_token".to_string()),
            jwt_cookie_secure: parse_flag("JWT_COOKIE_SECURE"),

            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            dashboard_cache_ttl_secs: parse_var("DASHBOARD_CACHE_TTL_SECS", "300")?,

            bootstrap_admin_email: optional_var("BOOTSTRAP_ADMIN_EMAIL"),
            bootstrap_admin_password: optional_var("BOOTSTRAP_ADMIN_PASSWORD"),
        };

        if config.bootstrap_admin_email.is_some() != config.bootstrap_admin_password.is_some() {
            return Err(ConfigError::MissingRequired(
                "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                    .to_string(),
            ));
        }

        Ok(config)
    }

    /// Defaults with an in-memory database; used by tests.
    pub fn for_tests() -> Self {
        ApiConfig {
            http_port: 0,
            database_path: ":memory:".to_string(),
            db_max_connections: 1,
            redis_url: None,
            redis_key_prefix: "zarmind:test:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_access_lifetime: DEFAULT_TOKEN_LIFETIME,
            jwt_remember_lifetime: Duration::from_secs(7 * 24 * 3600),
            jwt_issuer: None,
            jwt_audience: None,
            auth_use_cookies: false,
            jwt_cookie_name: "access_token".to_string(),
            jwt_cookie_secure: false,
            cors_origins: vec!["*".to_string()],
            dashboard_cache_ttl_secs: 300,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

fn parse_flag(name: &str) -> bool {
    matches!(
        env::var(name).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Ok("true" | "1" | "yes")
    )
}

/// Reads `30s`, `15m`, `10h`, `7d`, `1w` or raw seconds.
///
/// Anything unparseable falls back to 15 minutes.
pub fn parse_duration(raw: &str) -> Duration {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Duration::from_secs(secs);
    }

    let Some(unit) = raw.chars().last() else {
        return DEFAULT_TOKEN_LIFETIME;
    };
    let digits = &raw[..raw.len() - unit.len_utf8()];
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86_400,
        'w' => 604_800,
        _ => return DEFAULT_TOKEN_LIFETIME,
    };

    match digits.parse::<u64>() {
        Ok(n) if n > 0 => Duration::from_secs(n.saturating_mul(multiplier)),
        _ => DEFAULT_TOKEN_LIFETIME,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s"), Duration::from_secs(30));
        assert_eq!(parse_duration("15m"), Duration::from_secs(900));
        assert_eq!(parse_duration("10h"), Duration::from_secs(36_000));
        assert_eq!(parse_duration("7d"), Duration::from_secs(604_800));
        assert_eq!(parse_duration("1w"), Duration::from_secs(604_800));
        assert_eq!(parse_duration("120"), Duration::from_secs(120));
    }

    #[test]
    fn test_parse_duration_falls_back() {
        assert_eq!(parse_duration("soon"), DEFAULT_TOKEN_LIFETIME);
        assert_eq!(parse_duration("m"), DEFAULT_TOKEN_LIFETIME);
        assert_eq!(parse_duration(""), DEFAULT_TOKEN_LIFETIME);
        assert_eq!(parse_duration("5y"), DEFAULT_TOKEN_LIFETIME);
    }
}

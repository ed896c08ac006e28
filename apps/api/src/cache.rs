//! # Cache-Aside
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cache.wrap(key, ttl, producer)                                        │
//! │       │                                                                 │
//! │       ├── no store configured ───────────────► producer()              │
//! │       │                                                                 │
//! │       ├── GET key ── hit ──► deserialize ─ ok ──► return               │
//! │       │       │                    └─ bad ──┐                          │
//! │       │       └── error (warn) ─────────────┤                          │
//! │       │                                     ▼                          │
//! │       └── miss ──────────────────────► producer()                      │
//! │                                             │                          │
//! │                                             ▼                          │
//! │                                   SET key EX ttl (errors: warn only)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache never turns a successful producer into a failure.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

/// Cache backend failure. Never surfaces to clients.
#[derive(Debug, thiserror::Error)]
#[error("Cache error: {0}")]
pub struct CacheError(pub String);

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError(err.to_string())
    }
}

/// A key/value store with expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

// =============================================================================
// Redis
// =============================================================================

/// Redis-backed store over a reconnecting connection manager.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to Redis");
        Ok(RedisCache { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

// =============================================================================
// Wrapper
// =============================================================================

/// Reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Disabled,
    Up,
    Down,
}

/// Cache-aside wrapper; a disabled cache always runs the producer.
#[derive(Clone, Default)]
pub struct Cache {
    store: Option<Arc<dyn CacheStore>>,
    prefix: String,
}

impl Cache {
    pub fn disabled() -> Self {
        Cache::default()
    }

    pub fn new(store: Arc<dyn CacheStore>, prefix: impl Into<String>) -> Self {
        Cache {
            store: Some(store),
            prefix: prefix.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn status(&self) -> CacheStatus {
        match &self.store {
            None => CacheStatus::Disabled,
            Some(store) => match store.ping().await {
                Ok(()) => CacheStatus::Up,
                Err(e) => {
                    warn!(error = %e, "Cache ping failed");
                    CacheStatus::Down
                }
            },
        }
    }

    /// Returns the cached value for `key`, or runs `producer` and stores its
    /// result for `ttl_secs`.
    pub async fn wrap<T, E, F, Fut>(&self, key: &str, ttl_secs: u64, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(store) = &self.store else {
            return producer().await;
        };
        let full_key = format!("{}{}", self.prefix, key);

        match store.get(&full_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => warn!(key = %full_key, error = %e, "Discarding unreadable cache entry"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = %full_key, error = %e, "Cache read failed"),
        }

        let value = producer().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = store.set(&full_key, &raw, ttl_secs).await {
                    warn!(key = %full_key, error = %e, "Cache write failed");
                }
            }
            Err(e) => warn!(key = %full_key, error = %e, "Value not cacheable"),
        }

        Ok(value)
    }
}

/// `endpoint:{json params}`, or the endpoint alone when the params do not
/// serialize.
pub fn cache_key<P: Serialize>(endpoint: &str, params: &P) -> String {
    match serde_json::to_string(params) {
        Ok(json) => format!("{endpoint}:{json}"),
        Err(_) => endpoint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: u64) -> Result<(), CacheError> {
            Err(CacheError("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<(), CacheError> {
            Err(CacheError("connection refused".to_string()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl CacheStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: u64) -> Result<(), CacheError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn ping(&self) -> Result<(), CacheError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failing_store_yields_producer_result() {
        let cache = Cache::new(Arc::new(FailingStore), "t:");
        let value: Result<i64, String> = cache.wrap("k", 60, || async { Ok(42) }).await;
        assert_eq!(value, Ok(42));
        assert_eq!(cache.status().await, CacheStatus::Down);
    }

    #[tokio::test]
    async fn test_hit_skips_producer() {
        let cache = Cache::new(Arc::new(MemoryStore::default()), "t:");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<String, String> = cache
                .wrap("dashboard", 60, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("fresh".to_string())
                })
                .await;
            assert_eq!(value.unwrap(), "fresh");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_runs_producer() {
        let cache = Cache::disabled();
        let value: Result<i64, String> = cache.wrap("k", 60, || async { Ok(7) }).await;
        assert_eq!(value, Ok(7));
        assert_eq!(cache.status().await, CacheStatus::Disabled);
    }

    #[tokio::test]
    async fn test_producer_errors_are_not_cached() {
        let store = Arc::new(MemoryStore::default());
        let cache = Cache::new(store.clone(), "t:");
        let value: Result<i64, String> = cache.wrap("k", 60, || async { Err("boom".to_string()) }).await;
        assert!(value.is_err());
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cache_key() {
        let key = cache_key("analytics:dashboard", &serde_json::json!({"branchId": "b1"}));
        assert_eq!(key, r#"analytics:dashboard:{"branchId":"b1"}"#);
    }

    #[test]
    fn test_cache_key_falls_back_to_endpoint() {
        // JSON object keys must be strings, so tuple keys cannot serialize.
        let params: HashMap<(i32, i32), i32> = HashMap::from([((1, 2), 3)]);
        assert_eq!(cache_key("analytics:dashboard", &params), "analytics:dashboard");
    }
}

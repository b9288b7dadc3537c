//! Cache store abstraction and its Redis / in-process implementations.
//!
//! Values are opaque strings at this layer; callers serialize and
//! deserialize. Connection or protocol failures surface as
//! `AppError::Cache` and are never swallowed here.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use common::{AppError, AppResult};
use domain::user_cache_key;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Per-call cache opt-in: where to cache and for how long.
///
/// Operations called without a `CacheModel` never touch the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheModel {
    pub key: String,
    /// Entry lifetime in seconds
    pub expiration: u64,
}

impl CacheModel {
    pub fn new(key: impl Into<String>, expiration: u64) -> Self {
        Self {
            key: key.into(),
            expiration,
        }
    }

    /// The `user:{username}` entry
    pub fn for_user(username: &str, expiration: u64) -> Self {
        Self::new(user_cache_key(username), expiration)
    }
}

/// TTL-bounded key/value store.
///
/// A zero ttl stores nothing and drops any previous value for the key.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store `value` under `key` for `ttl_seconds`
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()>;

    /// Fetch a live value; absent or expired keys yield `None`
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Remove a key (absent keys are not an error)
    async fn delete(&self, key: &str) -> AppResult<()>;
}

// =============================================================================
// Redis
// =============================================================================

/// Redis cache backed by a multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis and verify the connection with a `PING`.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = Client::open(url).map_err(cache_error)?;
        let mut connection = ConnectionManager::new(client).await.map_err(cache_error)?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(cache_error)?;

        tracing::info!("Redis cache connected");
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        if ttl_seconds == 0 {
            return self.delete(key).await;
        }

        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(cache_error)?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await.map_err(cache_error)?;
        Ok(())
    }
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::from(e)
}

// =============================================================================
// In-process
// =============================================================================

/// In-process cache for local runs and tests.
///
/// Uses the tokio clock, so paused-time tests can step past expirations.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a live entry exists for `key`
    pub async fn contains(&self, key: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        if ttl_seconds == 0 {
            entries.remove(key);
            return Ok(());
        }

        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(ttl_seconds))
            .ok_or_else(|| AppError::cache("ttl out of range"))?;

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict unless a writer refreshed it meanwhile
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

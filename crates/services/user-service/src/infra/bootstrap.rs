//! One-time process bootstrap for shared infrastructure.
//!
//! The Redis connection is process-wide state: it is established once,
//! before any repository runs, and handed to repositories and services as
//! an `Arc<dyn CacheStore>`.

use std::sync::Arc;
use tokio::sync::OnceCell;

use common::{AppError, AppResult};

use super::cache::{CacheStore, RedisCache};
use crate::clients::ParameterSource;
use crate::config::UserServiceConfig;

static CACHE: OnceCell<Arc<RedisCache>> = OnceCell::const_new();

/// Initialize the shared Redis cache, or return the existing handle.
///
/// Concurrent callers wait for the single in-flight initialization. A failed
/// attempt leaves the cell empty so the caller can fail fast.
pub async fn init_cache(
    config: &UserServiceConfig,
    params: &dyn ParameterSource,
) -> AppResult<Arc<dyn CacheStore>> {
    let cache = CACHE
        .get_or_try_init(|| async {
            let url = resolve_redis_url(config, params).await?;
            let cache = RedisCache::connect(&url).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to initialize Redis client");
                e
            })?;
            tracing::info!("Redis client initialized successfully");
            Ok::<_, AppError>(Arc::new(cache))
        })
        .await?;

    Ok(cache.clone())
}

/// Pick the Redis URL for the current environment.
///
/// Local and test environments use the configured URL directly; anything
/// else resolves it through the named parameter.
pub async fn resolve_redis_url(
    config: &UserServiceConfig,
    params: &dyn ParameterSource,
) -> AppResult<String> {
    if config.env.is_local() {
        tracing::info!(env = ?config.env, "Using local Redis URL");
        return Ok(config.cache.url.clone());
    }

    let name = config
        .cache
        .url_parameter
        .as_deref()
        .ok_or_else(|| AppError::configuration("REDIS_URL_PARAMETER is not set"))?;

    let url = params.get(name).await?;
    tracing::info!(parameter = %name, "Fetched Redis URL from parameter source");
    Ok(url)
}

//! Infrastructure layer - cache, database and process bootstrap.

pub mod bootstrap;
pub mod cache;
mod db;
pub mod migrations;

pub use bootstrap::{init_cache, resolve_redis_url};
pub use cache::{CacheModel, CacheStore, InMemoryCache, RedisCache};
pub use db::Database;
pub use migrations::Migrator;

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockCacheStore;

//! Persistent store contracts.

use async_trait::async_trait;

use common::AppResult;
use domain::{Record, User};

/// System of record for entities of type `R`.
///
/// Row counts are returned as-is; interpreting zero rows as "not found" is
/// the caller's concern.
#[async_trait]
pub trait PersistentStore<R: Record>: Send + Sync {
    /// Persist a new record and return it as stored (with its key)
    async fn insert(&self, record: R) -> AppResult<R>;

    async fn get_by_id(&self, id: R::Id) -> AppResult<Option<R>>;

    /// Apply a patch, returning the number of rows affected
    async fn update_by_id(&self, id: R::Id, patch: R::Patch) -> AppResult<u64>;

    /// Delete a record, returning the number of rows affected
    async fn delete_by_id(&self, id: R::Id) -> AppResult<u64>;

    /// All records in key order
    async fn list_all(&self) -> AppResult<Vec<R>>;

    async fn count(&self) -> AppResult<u64>;

    /// Records `[skip, skip + take)` in key order
    async fn slice(&self, skip: u64, take: u64) -> AppResult<Vec<R>>;
}

/// User store with lookups beyond the primary key.
#[async_trait]
pub trait UserStore: PersistentStore<User> {
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;
}

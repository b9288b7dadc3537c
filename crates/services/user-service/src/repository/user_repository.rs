//! User repository: the cache-aside contract the user flows depend on.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppError, AppResult, OptionExt};
use domain::{User, UserPatch};

use super::generic::{GenericRepository, Page};
use super::store::UserStore;
use crate::infra::{CacheModel, CacheStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Every operation opts into caching per call through its `CacheModel`.
/// Failures are logged and reported as a negative result.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user, caching it under the model's key
    async fn create(&self, user: User, cache: Option<CacheModel>) -> Option<User>;

    async fn find_by_id(&self, id: i64, cache: Option<CacheModel>) -> Option<User>;

    async fn find_by_username(&self, username: &str, cache: Option<CacheModel>) -> Option<User>;

    /// Patch a user and return the stored result
    async fn update(&self, id: i64, patch: UserPatch, cache: Option<CacheModel>) -> Option<User>;

    /// Delete a user and invalidate the model's key
    async fn delete(&self, id: i64, cache: Option<CacheModel>) -> bool;

    async fn find_all(&self, cache: Option<CacheModel>) -> Vec<User>;

    async fn find_paginated(&self, skip: u64, take: u64, cache: Option<CacheModel>) -> Page<User>;
}

/// `UserRepository` over any `UserStore`, fronted by the shared cache.
pub struct CachedUserRepository<S> {
    inner: GenericRepository<User, S>,
}

impl<S: UserStore> CachedUserRepository<S> {
    /// Create new repository instance
    pub fn new(store: Arc<S>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            inner: GenericRepository::new(store, cache),
        }
    }

    /// Cache-aside lookup by username; not-found is `AppError::NotFound`.
    pub async fn try_find_by_username(
        &self,
        username: &str,
        cache_model: Option<&CacheModel>,
    ) -> AppResult<User> {
        if let Some(model) = cache_model {
            if let Some(user) = self.inner.read_cache::<User>(model).await? {
                tracing::debug!(%username, key = %model.key, "Cache hit");
                return Ok(user);
            }
        }

        let user = self
            .inner
            .store()
            .get_by_username(username)
            .await?
            .ok_or_not_found()?;

        if let Some(model) = cache_model {
            self.inner.write_cache(model, &user).await?;
        }

        Ok(user)
    }
}

#[async_trait]
impl<S: UserStore> UserRepository for CachedUserRepository<S> {
    async fn create(&self, user: User, cache: Option<CacheModel>) -> Option<User> {
        self.inner.create(user, cache.as_ref()).await
    }

    async fn find_by_id(&self, id: i64, cache: Option<CacheModel>) -> Option<User> {
        self.inner.find_by_id(id, cache.as_ref()).await
    }

    async fn find_by_username(&self, username: &str, cache: Option<CacheModel>) -> Option<User> {
        match self.try_find_by_username(username, cache.as_ref()).await {
            Ok(user) => Some(user),
            Err(AppError::NotFound) => {
                tracing::info!(%username, "[UserRepository] User not found");
                None
            }
            Err(e) => {
                tracing::error!(%username, error = %e, "[UserRepository] Error finding user by username");
                None
            }
        }
    }

    async fn update(&self, id: i64, patch: UserPatch, cache: Option<CacheModel>) -> Option<User> {
        self.inner.update(id, patch, cache.as_ref()).await
    }

    async fn delete(&self, id: i64, cache: Option<CacheModel>) -> bool {
        self.inner.delete(id, cache.as_ref()).await
    }

    async fn find_all(&self, cache: Option<CacheModel>) -> Vec<User> {
        self.inner.find_all(cache.as_ref()).await
    }

    async fn find_paginated(&self, skip: u64, take: u64, cache: Option<CacheModel>) -> Page<User> {
        self.inner.find_paginated(skip, take, cache.as_ref()).await
    }
}

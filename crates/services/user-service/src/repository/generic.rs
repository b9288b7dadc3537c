//! Generic cache-aside repository.
//!
//! Reads consult the cache first when the caller supplies a `CacheModel`
//! and populate it on a miss. Writes go to the store first; the cache is
//! written (or invalidated) only after the store call succeeded. Updates
//! always re-read the canonical record from the store before caching it.
//!
//! Every operation has a fallible `try_*` form that separates "not found"
//! from infrastructure failures. The plain forms log the error and collapse
//! it into a negative result (`None`, `false`, empty), so callers of those
//! cannot tell a missing record from a failed round-trip.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

use common::{AppError, AppResult, OptionExt};
use domain::Record;

use super::store::PersistentStore;
use crate::infra::{CacheModel, CacheStore};

/// One page of records plus the size of the whole collection.
///
/// Cached as a single blob under the caller's key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<R> {
    pub data: Vec<R>,
    /// Total matching records, independent of the page window
    pub count: u64,
}

impl<R> Page<R> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            count: 0,
        }
    }
}

impl<R> Default for Page<R> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Cache-aside CRUD over a persistent store of `R`.
pub struct GenericRepository<R, S> {
    store: Arc<S>,
    cache: Arc<dyn CacheStore>,
    _record: PhantomData<fn() -> R>,
}

impl<R, S> Clone for GenericRepository<R, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            _record: PhantomData,
        }
    }
}

impl<R, S> GenericRepository<R, S>
where
    R: Record,
    S: PersistentStore<R>,
{
    pub fn new(store: Arc<S>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            cache,
            _record: PhantomData,
        }
    }

    /// Underlying system of record
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // =========================================================================
    // Negative-result operations
    // =========================================================================

    /// Persist `entity`; `None` if persisting or caching failed.
    pub async fn create(&self, entity: R, cache_model: Option<&CacheModel>) -> Option<R> {
        self.try_create(entity, cache_model)
            .await
            .map_err(|e| {
                tracing::error!(entity = R::NAME, error = %e, "[GenericRepository] Error creating entity");
            })
            .ok()
    }

    /// Look up a record; `None` when absent or on failure.
    pub async fn find_by_id(&self, id: R::Id, cache_model: Option<&CacheModel>) -> Option<R> {
        self.try_find_by_id(id, cache_model)
            .await
            .map_err(|e| log_lookup_failure::<R>(id, "finding", &e))
            .ok()
    }

    /// Patch a record and return its fresh state; `None` when absent or on failure.
    pub async fn update(
        &self,
        id: R::Id,
        patch: R::Patch,
        cache_model: Option<&CacheModel>,
    ) -> Option<R> {
        self.try_update(id, patch, cache_model)
            .await
            .map_err(|e| log_lookup_failure::<R>(id, "updating", &e))
            .ok()
    }

    /// Delete a record; `false` when absent or on failure.
    pub async fn delete(&self, id: R::Id, cache_model: Option<&CacheModel>) -> bool {
        self.try_delete(id, cache_model)
            .await
            .map_err(|e| log_lookup_failure::<R>(id, "deleting", &e))
            .is_ok()
    }

    /// Every record; empty on failure.
    pub async fn find_all(&self, cache_model: Option<&CacheModel>) -> Vec<R> {
        self.try_find_all(cache_model).await.unwrap_or_else(|e| {
            tracing::error!(entity = R::NAME, error = %e, "[GenericRepository] Error retrieving all entities");
            Vec::new()
        })
    }

    /// One page plus the total count; an empty page on failure.
    pub async fn find_paginated(
        &self,
        skip: u64,
        take: u64,
        cache_model: Option<&CacheModel>,
    ) -> Page<R> {
        self.try_find_paginated(skip, take, cache_model)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(entity = R::NAME, skip, take, error = %e, "[GenericRepository] Error in pagination");
                Page::empty()
            })
    }

    // =========================================================================
    // Fallible operations
    // =========================================================================

    pub async fn try_create(&self, entity: R, cache_model: Option<&CacheModel>) -> AppResult<R> {
        let stored = self.store.insert(entity).await?;

        if let Some(model) = cache_model {
            self.write_cache(model, &stored).await?;
        }

        Ok(stored)
    }

    pub async fn try_find_by_id(&self, id: R::Id, cache_model: Option<&CacheModel>) -> AppResult<R> {
        if let Some(model) = cache_model {
            if let Some(entity) = self.read_cache::<R>(model).await? {
                tracing::debug!(entity = R::NAME, %id, key = %model.key, "Cache hit");
                return Ok(entity);
            }
        }

        let entity = self.store.get_by_id(id).await?.ok_or_else(|| {
            tracing::info!(entity = R::NAME, %id, "[GenericRepository] Entity not found");
            AppError::NotFound
        })?;

        if let Some(model) = cache_model {
            self.write_cache(model, &entity).await?;
        }

        Ok(entity)
    }

    pub async fn try_update(
        &self,
        id: R::Id,
        patch: R::Patch,
        cache_model: Option<&CacheModel>,
    ) -> AppResult<R> {
        let affected = self.store.update_by_id(id, patch).await?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }

        // Cache only what the store now holds, never the patch itself
        let updated = self.store.get_by_id(id).await?.ok_or_not_found()?;

        if let Some(model) = cache_model {
            self.write_cache(model, &updated).await?;
        }

        Ok(updated)
    }

    pub async fn try_delete(&self, id: R::Id, cache_model: Option<&CacheModel>) -> AppResult<()> {
        let affected = self.store.delete_by_id(id).await?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }

        if let Some(model) = cache_model {
            self.cache.delete(&model.key).await?;
        }

        Ok(())
    }

    pub async fn try_find_all(&self, cache_model: Option<&CacheModel>) -> AppResult<Vec<R>> {
        if let Some(model) = cache_model {
            if let Some(entities) = self.read_cache::<Vec<R>>(model).await? {
                return Ok(entities);
            }
        }

        let entities = self.store.list_all().await?;

        if let Some(model) = cache_model {
            self.write_cache(model, &entities).await?;
        }

        Ok(entities)
    }

    /// Bounds are passed to the store untouched.
    pub async fn try_find_paginated(
        &self,
        skip: u64,
        take: u64,
        cache_model: Option<&CacheModel>,
    ) -> AppResult<Page<R>> {
        if let Some(model) = cache_model {
            if let Some(page) = self.read_cache::<Page<R>>(model).await? {
                return Ok(page);
            }
        }

        let count = self.store.count().await?;
        let data = self.store.slice(skip, take).await?;
        let page = Page { data, count };

        if let Some(model) = cache_model {
            self.write_cache(model, &page).await?;
        }

        Ok(page)
    }

    // =========================================================================
    // Cache helpers
    // =========================================================================

    pub(crate) async fn read_cache<T: DeserializeOwned + Send>(
        &self,
        model: &CacheModel,
    ) -> AppResult<Option<T>> {
        match self.cache.get(&model.key).await? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn write_cache<T: Serialize + Sync>(
        &self,
        model: &CacheModel,
        value: &T,
    ) -> AppResult<()> {
        let blob = serde_json::to_string(value)?;
        self.cache.set(&model.key, &blob, model.expiration).await
    }
}

fn log_lookup_failure<R: Record>(id: R::Id, action: &str, error: &AppError) {
    if error.is_not_found() {
        tracing::info!(entity = R::NAME, %id, "[GenericRepository] Entity not found while {}", action);
    } else {
        tracing::error!(entity = R::NAME, %id, error = %error, "[GenericRepository] Error {} entity", action);
    }
}

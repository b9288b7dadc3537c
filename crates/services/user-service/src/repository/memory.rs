//! In-process persistent store for local runs and tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use common::{AppError, AppResult};
use domain::{Record, User, UNASSIGNED_ID};

use super::store::{PersistentStore, UserStore};

/// Ordered in-memory table keyed by `i64` ids.
///
/// Records inserted with an unassigned id receive the next free key.
pub struct MemoryStore<R> {
    inner: RwLock<Table<R>>,
}

struct Table<R> {
    rows: BTreeMap<i64, R>,
    next_id: i64,
}

impl<R> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record<Id = i64>> PersistentStore<R> for MemoryStore<R> {
    async fn insert(&self, mut record: R) -> AppResult<R> {
        let mut table = self.inner.write().await;

        let id = match record.id() {
            UNASSIGNED_ID => {
                let id = table.next_id;
                if table.rows.contains_key(&id) {
                    return Err(AppError::internal(format!(
                        "{} id space exhausted",
                        R::NAME
                    )));
                }
                record.assign_id(id);
                id
            }
            id if table.rows.contains_key(&id) => {
                return Err(AppError::internal(format!(
                    "{} with id {} already exists",
                    R::NAME,
                    id
                )));
            }
            id => id,
        };

        table.next_id = table.next_id.max(id.saturating_add(1));
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<R>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn update_by_id(&self, id: i64, patch: R::Patch) -> AppResult<u64> {
        let mut table = self.inner.write().await;
        match table.rows.get_mut(&id) {
            Some(record) => {
                record.merge(patch);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<u64> {
        let removed = self.inner.write().await.rows.remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn list_all(&self) -> AppResult<Vec<R>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.inner.read().await.rows.len() as u64)
    }

    async fn slice(&self, skip: u64, take: u64) -> AppResult<Vec<R>> {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let take = usize::try_from(take).unwrap_or(usize::MAX);

        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore<User> {
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::UserPatch;

    fn user(name: &str) -> User {
        User::new(name.into(), format!("{}@example.com", name), "c2VjcmV0".into())
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store: MemoryStore<User> = MemoryStore::new();
        let a = store.insert(user("ann")).await.unwrap();
        let b = store.insert(user("bob")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn explicit_ids_are_kept_and_not_reused() {
        let store: MemoryStore<User> = MemoryStore::new();
        let mut first = user("ann");
        first.id = 42;
        store.insert(first.clone()).await.unwrap();
        assert!(store.insert(first).await.is_err());

        let next = store.insert(user("bob")).await.unwrap();
        assert_eq!(next.id, 43);
    }

    #[tokio::test]
    async fn largest_explicit_id_does_not_overflow() {
        let store: MemoryStore<User> = MemoryStore::new();
        let mut last = user("ann");
        last.id = i64::MAX;
        store.insert(last).await.unwrap();

        // No key left to assign; the existing row is not overwritten
        assert!(store.insert(user("bob")).await.is_err());
        let kept = store.get_by_id(i64::MAX).await.unwrap().unwrap();
        assert_eq!(kept.username, "ann");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_report_rows_affected() {
        let store: MemoryStore<User> = MemoryStore::new();
        let ann = store.insert(user("ann")).await.unwrap();

        assert_eq!(store.update_by_id(ann.id, UserPatch::password("x")).await.unwrap(), 1);
        assert_eq!(store.update_by_id(99, UserPatch::password("x")).await.unwrap(), 0);
        assert_eq!(store.get_by_id(ann.id).await.unwrap().unwrap().password, "x");

        assert_eq!(store.delete_by_id(ann.id).await.unwrap(), 1);
        assert_eq!(store.delete_by_id(ann.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn slice_windows_in_key_order() {
        let store: MemoryStore<User> = MemoryStore::new();
        for name in ["a", "b", "c", "d"] {
            store.insert(user(name)).await.unwrap();
        }

        let names: Vec<_> = store
            .slice(1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["b", "c"]);
        assert!(store.slice(10, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finds_users_by_username() {
        let store: MemoryStore<User> = MemoryStore::new();
        store.insert(user("ann")).await.unwrap();
        assert!(store.get_by_username("ann").await.unwrap().is_some());
        assert!(store.get_by_username("zoe").await.unwrap().is_none());
    }
}

//! End-to-end user flows over in-process cache and store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

use common::{AppError, AppResult};
use domain::{CreateUser, User, UserPatch};
use user_service_lib::clients::{IdentityProvider, ParameterSource, SecretCipher};
use user_service_lib::config::UserServiceConfig;
use user_service_lib::infra::{CacheModel, CacheStore, InMemoryCache};
use user_service_lib::repository::{
    CachedUserRepository, MemoryStore, PersistentStore, UserRepository, UserStore,
};
use user_service_lib::service::{
    PasswordEncryptor, RegistrationSaga, SagaState, UserManager, UserService,
};

// =============================================================================
// Fakes
// =============================================================================

/// Identity provider that records every call it receives
#[derive(Default)]
struct RecordingIdentity {
    calls: Mutex<Vec<String>>,
    reject_register: AtomicBool,
}

impl RecordingIdentity {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl IdentityProvider for RecordingIdentity {
    async fn register(&self, username: &str, _password: &str, _email: &str) -> AppResult<()> {
        self.record(format!("register:{}", username));
        if self.reject_register.load(Ordering::SeqCst) {
            return Err(AppError::external("UsernameExistsException"));
        }
        Ok(())
    }

    async fn authenticate(&self, username: &str, password: &str) -> AppResult<String> {
        self.record(format!("authenticate:{}", username));
        if password == "hunter2" {
            Ok(format!("token-for-{}", username))
        } else {
            Err(AppError::external("NotAuthorizedException"))
        }
    }

    async fn confirm_registration(&self, username: &str, _code: &str) -> AppResult<()> {
        self.record(format!("confirm:{}", username));
        Ok(())
    }

    async fn initiate_password_reset(&self, username: &str) -> AppResult<()> {
        self.record(format!("initiate_reset:{}", username));
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        username: &str,
        code: &str,
        _new_password: &str,
    ) -> AppResult<()> {
        self.record(format!("complete_reset:{}:{}", username, code));
        Ok(())
    }
}

/// Reversible stand-in for the key-managed cipher
struct TaggingCipher;

#[async_trait]
impl SecretCipher for TaggingCipher {
    async fn encrypt(&self, plaintext: &str, key_id: &str) -> AppResult<String> {
        Ok(format!("{}|{}", key_id, plaintext.chars().rev().collect::<String>()))
    }

    async fn decrypt(&self, ciphertext: &str, key_id: &str) -> AppResult<String> {
        ciphertext
            .strip_prefix(&format!("{}|", key_id))
            .map(|reversed| reversed.chars().rev().collect())
            .ok_or_else(|| AppError::external("InvalidCiphertextException"))
    }
}

struct FixedParameters;

#[async_trait]
impl ParameterSource for FixedParameters {
    async fn get(&self, name: &str) -> AppResult<String> {
        match name {
            "/myapp/kms-key-id" => Ok("alias/users".to_string()),
            other => Err(AppError::external(format!("Could not fetch parameter: {}", other))),
        }
    }
}

/// Memory store whose inserts can be made to fail
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore<User>,
    fail_inserts: AtomicBool,
}

#[async_trait]
impl PersistentStore<User> for FlakyStore {
    async fn insert(&self, record: User) -> AppResult<User> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::internal("duplicate key value violates unique constraint"));
        }
        self.inner.insert(record).await
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.inner.get_by_id(id).await
    }

    async fn update_by_id(&self, id: i64, patch: UserPatch) -> AppResult<u64> {
        self.inner.update_by_id(id, patch).await
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<u64> {
        self.inner.delete_by_id(id).await
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        self.inner.list_all().await
    }

    async fn count(&self) -> AppResult<u64> {
        self.inner.count().await
    }

    async fn slice(&self, skip: u64, take: u64) -> AppResult<Vec<User>> {
        self.inner.slice(skip, take).await
    }
}

#[async_trait]
impl UserStore for FlakyStore {
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.inner.get_by_username(username).await
    }
}

struct Harness {
    service: UserManager,
    identity: Arc<RecordingIdentity>,
    store: Arc<FlakyStore>,
    cache: Arc<InMemoryCache>,
    repo: Arc<CachedUserRepository<FlakyStore>>,
    encryptor: Arc<PasswordEncryptor>,
}

fn harness() -> Harness {
    let identity = Arc::new(RecordingIdentity::default());
    let store = Arc::new(FlakyStore::default());
    let cache = Arc::new(InMemoryCache::new());
    let repo = Arc::new(CachedUserRepository::new(store.clone(), cache.clone()));
    let encryptor = Arc::new(PasswordEncryptor::new(
        Arc::new(TaggingCipher),
        Arc::new(FixedParameters),
        "/myapp/kms-key-id",
    ));
    let service = UserManager::new(
        repo.clone(),
        cache.clone(),
        identity.clone(),
        encryptor.clone(),
    );

    Harness {
        service,
        identity,
        store,
        cache,
        repo,
        encryptor,
    }
}

fn ann() -> CreateUser {
    CreateUser {
        username: "ann".into(),
        password: "hunter2".into(),
        email: "ann@example.com".into(),
    }
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn register_persists_encrypted_secret_and_caches_user() {
    let h = harness();

    let user = assert_ok!(h.service.register(ann()).await);
    assert!(user.is_persisted());
    assert_eq!(user.password, "alias/users|2retnuh");

    let blob = h.cache.get("user:ann").await.unwrap().unwrap();
    let cached: User = serde_json::from_str(&blob).unwrap();
    assert_eq!(cached, user);
    assert_eq!(h.identity.calls(), vec!["register:ann"]);
}

#[tokio::test(start_paused = true)]
async fn configured_ttl_bounds_cached_user_entry() {
    let mut config = UserServiceConfig::default();
    config.cache.default_ttl_seconds = 120;

    let identity = Arc::new(RecordingIdentity::default());
    let store = Arc::new(FlakyStore::default());
    let cache = Arc::new(InMemoryCache::new());
    let repo = Arc::new(CachedUserRepository::new(store, cache.clone()));
    let service = UserManager::from_config(
        &config,
        repo,
        cache.clone(),
        identity,
        Arc::new(TaggingCipher),
        Arc::new(FixedParameters),
    );

    let user = assert_ok!(service.register(ann()).await);
    assert_eq!(user.password, "alias/users|2retnuh");

    tokio::time::advance(std::time::Duration::from_secs(119)).await;
    assert!(cache.contains("user:ann").await);
    tokio::time::advance(std::time::Duration::from_secs(1)).await;
    assert!(!cache.contains("user:ann").await);
}

#[tokio::test]
async fn persistence_failure_rolls_back_cache_only() {
    let h = harness();
    h.store.fail_inserts.store(true, Ordering::SeqCst);
    h.cache.set("ann", "pending", 60).await.unwrap();
    h.cache.set("user:ann", "{}", 60).await.unwrap();

    let saga = RegistrationSaga::new(
        h.identity.clone(),
        h.encryptor.clone(),
        h.repo.clone(),
        h.cache.clone(),
    );
    let outcome = saga.run(&ann()).await;

    assert_eq!(outcome.state, SagaState::RolledBack);
    assert_eq!(outcome.invalidated_keys, vec!["ann", "user:ann"]);
    assert!(h.cache.is_empty().await);
    // The identity stays registered: no compensating provider call
    assert_eq!(h.identity.calls(), vec!["register:ann"]);
    assert_eq!(assert_err!(outcome.result).to_string(), "Registration failed");
}

#[tokio::test]
async fn rejected_sign_up_keeps_identity_key() {
    let h = harness();
    h.identity.reject_register.store(true, Ordering::SeqCst);
    h.cache.set("ann", "other", 60).await.unwrap();

    let err = assert_err!(h.service.register(ann()).await);
    assert_eq!(err.http_status(), 500);
    assert!(h.cache.contains("ann").await);
    assert_eq!(h.store.count().await.unwrap(), 0);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn authenticate_warms_user_cache() {
    let h = harness();
    assert_ok!(h.service.register(ann()).await);
    h.cache.delete("user:ann").await.unwrap();

    let token = assert_ok!(h.service.authenticate("ann", "hunter2").await);
    assert_eq!(token.token, "token-for-ann");
    assert!(h.cache.contains("user:ann").await);
}

#[tokio::test]
async fn authenticate_with_wrong_password_fails_generically() {
    let h = harness();
    assert_ok!(h.service.register(ann()).await);

    let err = assert_err!(h.service.authenticate("ann", "nope").await);
    assert_eq!(err.to_string(), "Authentication failed: Invalid username or password");
}

#[tokio::test]
async fn confirm_registration_delegates_to_provider() {
    let h = harness();
    assert_ok!(h.service.confirm_registration("ann", "123456").await);
    assert_eq!(h.identity.calls(), vec!["confirm:ann"]);
}

// =============================================================================
// Password reset
// =============================================================================

#[tokio::test]
async fn password_reset_replaces_secret_in_store_and_cache() {
    let h = harness();
    let user = assert_ok!(h.service.register(ann()).await);

    assert_ok!(h.service.initiate_password_reset("ann").await);
    assert_ok!(
        h.service
            .complete_password_reset("ann", "n3w-pass", "654321")
            .await
    );

    let stored = h.store.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.password, "alias/users|ssap-w3n");

    let blob = h.cache.get("user:ann").await.unwrap().unwrap();
    let cached: User = serde_json::from_str(&blob).unwrap();
    assert_eq!(cached.password, stored.password);

    assert_eq!(
        h.identity.calls(),
        vec![
            "register:ann",
            "initiate_reset:ann",
            "complete_reset:ann:654321"
        ]
    );
}

#[tokio::test]
async fn password_reset_with_empty_code_makes_no_calls() {
    let h = harness();

    let err = assert_err!(h.service.complete_password_reset("ann", "n3w-pass", "").await);
    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.identity.calls().is_empty());
}

#[tokio::test]
async fn password_reset_for_unknown_local_user_is_not_found() {
    let h = harness();

    let err = assert_err!(
        h.service
            .complete_password_reset("ghost", "n3w-pass", "654321")
            .await
    );
    assert!(err.is_not_found());
    // The provider-side reset already happened and is left in place
    assert_eq!(h.identity.calls(), vec!["complete_reset:ghost:654321"]);
}

// =============================================================================
// Record operations
// =============================================================================

#[tokio::test]
async fn crud_passthroughs_follow_cache_aside() {
    let h = harness();
    let user = assert_ok!(h.service.register(ann()).await);
    let by_id = CacheModel::new(format!("users:{}", user.id), 120);

    assert_eq!(h.service.find_by_id(user.id, Some(by_id.clone())).await, Some(user.clone()));
    assert!(h.cache.contains(&by_id.key).await);

    let patch = UserPatch {
        is_active: Some(false),
        ..UserPatch::default()
    };
    let updated = h.service.update(user.id, patch, Some(by_id.clone())).await.unwrap();
    assert!(!updated.is_active);

    assert_eq!(h.service.find_all(None).await, vec![updated.clone()]);
    assert_eq!(h.service.find_paginated(0, 10, None).await.count, 1);

    assert!(h.service.delete(user.id, Some(by_id.clone())).await);
    assert!(!h.cache.contains(&by_id.key).await);
    assert!(h.repo.find_by_id(user.id, None).await.is_none());
}

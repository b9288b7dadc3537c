//! User service - entry point for the user flows.
//!
//! SOLID (SRP): composes registration, authentication and password reset;
//! record-level operations pass straight through to the repository.

use async_trait::async_trait;
use std::sync::Arc;

use common::AppResult;
use domain::{CreateUser, User, UserPatch};

use super::authentication::AuthenticationService;
use super::password::PasswordEncryptor;
use super::password_reset::PasswordResetFlow;
use super::registration::RegistrationSaga;
use crate::clients::{AuthToken, IdentityProvider, ParameterSource, SecretCipher};
use crate::config::UserServiceConfig;
use crate::infra::{CacheModel, CacheStore};
use crate::repository::{Page, UserRepository};

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Validate and run the registration saga
    async fn register(&self, request: CreateUser) -> AppResult<User>;

    async fn confirm_registration(&self, username: &str, code: &str) -> AppResult<()>;

    async fn authenticate(&self, username: &str, password: &str) -> AppResult<AuthToken>;

    async fn initiate_password_reset(&self, username: &str) -> AppResult<()>;

    async fn complete_password_reset(
        &self,
        username: &str,
        new_password: &str,
        confirmation_code: &str,
    ) -> AppResult<()>;

    async fn find_by_id(&self, id: i64, cache: Option<CacheModel>) -> Option<User>;

    async fn update(&self, id: i64, patch: UserPatch, cache: Option<CacheModel>) -> Option<User>;

    async fn delete(&self, id: i64, cache: Option<CacheModel>) -> bool;

    async fn find_all(&self, cache: Option<CacheModel>) -> Vec<User>;

    async fn find_paginated(&self, skip: u64, take: u64, cache: Option<CacheModel>) -> Page<User>;
}

/// Concrete implementation of UserService.
pub struct UserManager {
    registration: RegistrationSaga,
    authentication: AuthenticationService,
    password_reset: PasswordResetFlow,
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Wire the flows over shared collaborators
    pub fn new(
        repo: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
        identity: Arc<dyn IdentityProvider>,
        encryptor: Arc<PasswordEncryptor>,
    ) -> Self {
        Self {
            registration: RegistrationSaga::new(
                identity.clone(),
                encryptor.clone(),
                repo.clone(),
                cache,
            ),
            authentication: AuthenticationService::new(identity.clone(), repo.clone()),
            password_reset: PasswordResetFlow::new(identity, encryptor, repo.clone()),
            repo,
        }
    }

    /// Wire the flows from service configuration
    ///
    /// Secrets are encrypted under the key named by `kms_key_id_parameter`
    /// and user entries live for `cache.default_ttl_seconds`.
    pub fn from_config(
        config: &UserServiceConfig,
        repo: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
        identity: Arc<dyn IdentityProvider>,
        cipher: Arc<dyn SecretCipher>,
        params: Arc<dyn ParameterSource>,
    ) -> Self {
        let encryptor = Arc::new(PasswordEncryptor::new(
            cipher,
            params,
            config.kms_key_id_parameter.clone(),
        ));
        Self::new(repo, cache, identity, encryptor).with_cache_ttl(config.cache.default_ttl_seconds)
    }

    /// Lifetime in seconds of the `user:{username}` entries the flows write
    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.registration = self.registration.with_cache_ttl(ttl_seconds);
        self.password_reset = self.password_reset.with_cache_ttl(ttl_seconds);
        self
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn register(&self, request: CreateUser) -> AppResult<User> {
        request.validate()?;
        self.registration.register(&request).await
    }

    async fn confirm_registration(&self, username: &str, code: &str) -> AppResult<()> {
        self.authentication.confirm_registration(username, code).await
    }

    async fn authenticate(&self, username: &str, password: &str) -> AppResult<AuthToken> {
        self.authentication.authenticate(username, password).await
    }

    async fn initiate_password_reset(&self, username: &str) -> AppResult<()> {
        self.password_reset.initiate(username).await
    }

    async fn complete_password_reset(
        &self,
        username: &str,
        new_password: &str,
        confirmation_code: &str,
    ) -> AppResult<()> {
        self.password_reset
            .complete(username, new_password, confirmation_code)
            .await
    }

    async fn find_by_id(&self, id: i64, cache: Option<CacheModel>) -> Option<User> {
        tracing::info!(id, "Finding user by id");
        self.repo.find_by_id(id, cache).await
    }

    async fn update(&self, id: i64, patch: UserPatch, cache: Option<CacheModel>) -> Option<User> {
        tracing::info!(id, "Updating user");
        self.repo.update(id, patch, cache).await
    }

    async fn delete(&self, id: i64, cache: Option<CacheModel>) -> bool {
        tracing::info!(id, "Deleting user");
        self.repo.delete(id, cache).await
    }

    async fn find_all(&self, cache: Option<CacheModel>) -> Vec<User> {
        tracing::info!("Finding all users");
        self.repo.find_all(cache).await
    }

    async fn find_paginated(&self, skip: u64, take: u64, cache: Option<CacheModel>) -> Page<User> {
        tracing::info!(skip, take, "Finding users page");
        self.repo.find_paginated(skip, take, cache).await
    }
}

//! User registration saga.
//!
//! Three steps run in order: sign-up with the identity provider, secret
//! encryption and persistence. There is no atomic commit across them. When
//! a step fails the saga compensates by invalidating cache entries only:
//!
//! - failure before the identity exists drops `user:{username}`
//! - failure after it drops the identity key and `user:{username}`
//!
//! The identity registered with the provider is never revoked.
// TODO: decide whether rollback after IdentityCreated should also remove the
// provider-side identity; today it only clears cache entries.

use std::sync::Arc;

use common::{AppError, AppResult};
use domain::{identity_cache_key, user_cache_key, CreateUser, User, DEFAULT_CACHE_TTL_SECONDS};

use super::password::PasswordEncryptor;
use crate::clients::IdentityProvider;
use crate::infra::{CacheModel, CacheStore};
use crate::repository::UserRepository;

/// Saga progress.
///
/// `Started → IdentityCreated → PersistenceAttempted → Completed`, with a
/// jump to `RolledBack` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Started,
    IdentityCreated,
    PersistenceAttempted,
    Completed,
    RolledBack,
}

impl SagaState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SagaState::Completed | SagaState::RolledBack)
    }

    fn can_advance_to(self, next: SagaState) -> bool {
        use SagaState::*;
        matches!(
            (self, next),
            (Started, IdentityCreated)
                | (IdentityCreated, PersistenceAttempted)
                | (PersistenceAttempted, Completed)
                | (Started | IdentityCreated | PersistenceAttempted, RolledBack)
        )
    }
}

/// Terminal result of one saga run.
#[derive(Debug)]
pub struct RegistrationOutcome {
    pub state: SagaState,
    /// Cache keys removed by compensation, in deletion order
    pub invalidated_keys: Vec<String>,
    pub result: AppResult<User>,
}

impl RegistrationOutcome {
    pub fn into_result(self) -> AppResult<User> {
        self.result
    }
}

/// Orchestrates identity sign-up, secret encryption and persistence.
pub struct RegistrationSaga {
    identity: Arc<dyn IdentityProvider>,
    encryptor: Arc<PasswordEncryptor>,
    repo: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheStore>,
    cache_ttl: u64,
}

impl RegistrationSaga {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        encryptor: Arc<PasswordEncryptor>,
        repo: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            identity,
            encryptor,
            repo,
            cache,
            cache_ttl: DEFAULT_CACHE_TTL_SECONDS,
        }
    }

    /// Lifetime in seconds of the `user:{username}` entry written on success
    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.cache_ttl = ttl_seconds;
        self
    }

    /// Register a user, returning the persisted record.
    pub async fn register(&self, request: &CreateUser) -> AppResult<User> {
        self.run(request).await.into_result()
    }

    /// Run the saga to a terminal state. Input is assumed validated.
    pub async fn run(&self, request: &CreateUser) -> RegistrationOutcome {
        let username = request.username.as_str();
        let mut state = SagaState::Started;
        tracing::info!(%username, "Registering user");

        if let Err(e) = self
            .identity
            .register(username, &request.password, &request.email)
            .await
        {
            return self.roll_back(state, username, e).await;
        }
        state = advance(state, SagaState::IdentityCreated);
        tracing::info!(%username, "Identity created");

        let secret = match self.encryptor.encrypt(&request.password).await {
            Ok(secret) => secret,
            Err(e) => return self.roll_back(state, username, e).await,
        };

        state = advance(state, SagaState::PersistenceAttempted);
        let user = User::new(request.username.clone(), request.email.clone(), secret);
        match self
            .repo
            .create(
                user,
                Some(CacheModel::for_user(username, self.cache_ttl)),
            )
            .await
        {
            Some(user) => {
                let state = advance(state, SagaState::Completed);
                tracing::info!(%username, id = user.id, "User registered");
                RegistrationOutcome {
                    state,
                    invalidated_keys: Vec::new(),
                    result: Ok(user),
                }
            }
            None => {
                let cause = AppError::internal("Failed to persist user");
                self.roll_back(state, username, cause).await
            }
        }
    }

    async fn roll_back(&self, from: SagaState, username: &str, cause: AppError) -> RegistrationOutcome {
        tracing::error!(%username, state = ?from, error = %cause, "Registration failed, rolling back");

        let keys = if from == SagaState::Started {
            vec![user_cache_key(username)]
        } else {
            vec![identity_cache_key(username), user_cache_key(username)]
        };

        let mut invalidated_keys = Vec::with_capacity(keys.len());
        for key in keys {
            match self.cache.delete(&key).await {
                Ok(()) => invalidated_keys.push(key),
                Err(e) => {
                    tracing::warn!(%username, key = %key, error = %e, "Failed to invalidate cache during rollback");
                }
            }
        }

        RegistrationOutcome {
            state: advance(from, SagaState::RolledBack),
            invalidated_keys,
            result: Err(AppError::external_from("Registration failed", cause)),
        }
    }
}

fn advance(from: SagaState, to: SagaState) -> SagaState {
    debug_assert!(from.can_advance_to(to), "invalid saga transition {:?} -> {:?}", from, to);
    to
}

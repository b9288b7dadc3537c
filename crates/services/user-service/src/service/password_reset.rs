//! Two-phase password reset.
//!
//! `initiate` asks the identity provider to send a reset code. `complete`
//! exchanges the code for a new password with the provider, then stores
//! the newly encrypted secret. A provider-side reset is not undone when a
//! later local step fails.

use std::sync::Arc;

use common::{AppError, AppResult};
use domain::{validate_password_reset, UserPatch, DEFAULT_CACHE_TTL_SECONDS};

use super::password::PasswordEncryptor;
use crate::clients::IdentityProvider;
use crate::infra::CacheModel;
use crate::repository::UserRepository;

pub struct PasswordResetFlow {
    identity: Arc<dyn IdentityProvider>,
    encryptor: Arc<PasswordEncryptor>,
    repo: Arc<dyn UserRepository>,
    cache_ttl: u64,
}

impl PasswordResetFlow {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        encryptor: Arc<PasswordEncryptor>,
        repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            identity,
            encryptor,
            repo,
            cache_ttl: DEFAULT_CACHE_TTL_SECONDS,
        }
    }

    /// Lifetime in seconds of the refreshed `user:{username}` entry
    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.cache_ttl = ttl_seconds;
        self
    }

    /// Send a reset code for `username`.
    pub async fn initiate(&self, username: &str) -> AppResult<()> {
        self.identity
            .initiate_password_reset(username)
            .await
            .map_err(|e| {
                tracing::error!(%username, error = %e, "Error initiating password reset");
                AppError::external_from("Failed to initiate password reset", e)
            })?;

        tracing::info!(%username, "Password reset initiated");
        Ok(())
    }

    /// Apply a new password using the code from `initiate`.
    ///
    /// Missing input fails with `Validation` before any external call, and an
    /// unknown local user with `NotFound`. Everything else is reported as an
    /// external-service failure.
    pub async fn complete(
        &self,
        username: &str,
        new_password: &str,
        confirmation_code: &str,
    ) -> AppResult<()> {
        validate_password_reset(username, new_password, confirmation_code)?;

        self.identity
            .complete_password_reset(username, confirmation_code, new_password)
            .await
            .map_err(|e| reset_failed(username, e))?;

        let secret = self
            .encryptor
            .encrypt(new_password)
            .await
            .map_err(|e| reset_failed(username, e))?;

        let user = self
            .repo
            .find_by_username(username, None)
            .await
            .ok_or_else(|| {
                tracing::warn!(%username, "Password reset for unknown user");
                AppError::NotFound
            })?;

        self.repo
            .update(
                user.id,
                UserPatch::password(secret),
                Some(CacheModel::for_user(username, self.cache_ttl)),
            )
            .await
            .ok_or_else(|| reset_failed(username, AppError::internal("Failed to update user")))?;

        tracing::info!(%username, "Password reset completed");
        Ok(())
    }
}

fn reset_failed(username: &str, cause: AppError) -> AppError {
    tracing::error!(%username, error = %cause, "Error resetting password");
    AppError::external_from("Failed to reset password", cause)
}

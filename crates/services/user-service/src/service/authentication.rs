//! Sign-up confirmation and login.

use std::sync::Arc;

use common::{AppError, AppResult, OptionExt};
use domain::{user_cache_key, AUTH_USER_CACHE_TTL_SECONDS};

use crate::clients::{AuthToken, IdentityProvider};
use crate::infra::CacheModel;
use crate::repository::UserRepository;

/// Authentication against the identity provider, warming the user cache.
pub struct AuthenticationService {
    identity: Arc<dyn IdentityProvider>,
    repo: Arc<dyn UserRepository>,
}

impl AuthenticationService {
    pub fn new(identity: Arc<dyn IdentityProvider>, repo: Arc<dyn UserRepository>) -> Self {
        Self { identity, repo }
    }

    /// Confirm a pending sign-up.
    pub async fn confirm_registration(&self, username: &str, code: &str) -> AppResult<()> {
        self.identity
            .confirm_registration(username, code)
            .await
            .map_err(|e| {
                tracing::error!(%username, error = %e, "Error confirming user");
                AppError::external_from("User confirmation failed", e)
            })?;

        tracing::info!(%username, "User confirmed");
        Ok(())
    }

    /// Log in and make sure the local user record is cached.
    ///
    /// Fails when the provider rejects the credentials or no local record
    /// exists for `username`; both surface as the same external failure.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<AuthToken> {
        let result = async {
            let token = self.identity.authenticate(username, password).await?;

            let cache_model = CacheModel::new(user_cache_key(username), AUTH_USER_CACHE_TTL_SECONDS);
            self.repo
                .find_by_username(username, Some(cache_model))
                .await
                .ok_or_not_found()?;

            Ok::<_, AppError>(AuthToken::new(token))
        }
        .await;

        result.map_err(|e| {
            tracing::error!(%username, error = %e, "Error authenticating user");
            AppError::external_from("Authentication failed: Invalid username or password", e)
        })
    }
}

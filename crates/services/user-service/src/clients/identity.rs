//! Identity provider contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use common::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Token issued by the identity provider after a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// External user directory that owns credentials and confirmation codes.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign up a new identity
    async fn register(&self, username: &str, password: &str, email: &str) -> AppResult<()>;

    /// Exchange credentials for an identity token
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<String>;

    /// Confirm a sign-up with the code sent to the user
    async fn confirm_registration(&self, username: &str, code: &str) -> AppResult<()>;

    /// Send a password reset code to the user
    async fn initiate_password_reset(&self, username: &str) -> AppResult<()>;

    /// Set a new password using a previously issued reset code
    async fn complete_password_reset(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> AppResult<()>;
}

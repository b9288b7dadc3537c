//! Secret encryption contract.

use async_trait::async_trait;

use common::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Key-managed encryption service. Ciphertexts travel as base64 strings.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SecretCipher: Send + Sync {
    async fn encrypt(&self, plaintext: &str, key_id: &str) -> AppResult<String>;

    async fn decrypt(&self, ciphertext: &str, key_id: &str) -> AppResult<String>;
}

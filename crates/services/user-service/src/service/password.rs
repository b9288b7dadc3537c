//! Secret encryption with a parameter-resolved key id.

use std::sync::Arc;

use common::{AppError, AppResult};

use crate::clients::{ParameterSource, SecretCipher};

/// Encrypts user secrets under the key named by a configuration parameter.
///
/// The key id is looked up on every call; wrap the parameter source in a
/// `MemoizedParameterSource` to resolve it once per process.
pub struct PasswordEncryptor {
    cipher: Arc<dyn SecretCipher>,
    params: Arc<dyn ParameterSource>,
    key_id_parameter: String,
}

impl PasswordEncryptor {
    pub fn new(
        cipher: Arc<dyn SecretCipher>,
        params: Arc<dyn ParameterSource>,
        key_id_parameter: impl Into<String>,
    ) -> Self {
        Self {
            cipher,
            params,
            key_id_parameter: key_id_parameter.into(),
        }
    }

    /// Encrypt `plaintext`, returning base64 ciphertext.
    pub async fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        let result = async {
            let key_id = self.params.get(&self.key_id_parameter).await?;
            self.cipher.encrypt(plaintext, &key_id).await
        }
        .await;

        result.map_err(|e| {
            tracing::error!(error = %e, "Error encrypting password");
            AppError::external_from("Failed to encrypt password", e)
        })
    }
}

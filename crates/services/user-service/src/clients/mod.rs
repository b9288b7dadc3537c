//! Contracts for the external collaborators the user flows consume.
//!
//! Only the shapes live here: the identity provider's protocol and the
//! cipher's cryptography belong to their respective services.

mod cipher;
mod identity;
mod parameters;

pub use cipher::SecretCipher;
pub use identity::{AuthToken, IdentityProvider};
pub use parameters::{EnvParameterSource, MemoizedParameterSource, ParameterSource};

#[cfg(any(test, feature = "test-utils"))]
pub use cipher::MockSecretCipher;
#[cfg(any(test, feature = "test-utils"))]
pub use identity::MockIdentityProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use parameters::MockParameterSource;

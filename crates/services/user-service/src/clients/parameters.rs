//! Configuration parameter resolution.
//!
//! Local and test deployments read parameters from the process
//! environment. Remote parameter services implement the same trait.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use common::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Named configuration lookup.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ParameterSource: Send + Sync {
    async fn get(&self, name: &str) -> AppResult<String>;
}

/// Resolves a parameter name as an environment variable.
#[derive(Debug, Default, Clone)]
pub struct EnvParameterSource;

#[async_trait]
impl ParameterSource for EnvParameterSource {
    async fn get(&self, name: &str) -> AppResult<String> {
        match std::env::var(name) {
            Ok(value) => {
                tracing::debug!(parameter = %name, "Using environment variable");
                Ok(value)
            }
            Err(_) => Err(AppError::external(format!(
                "Could not fetch parameter: {}",
                name
            ))),
        }
    }
}

/// Memoizes successful lookups of another source for the process lifetime.
///
/// Failed lookups are not remembered and are retried on the next call.
pub struct MemoizedParameterSource {
    inner: Arc<dyn ParameterSource>,
    values: RwLock<HashMap<String, String>>,
}

impl MemoizedParameterSource {
    pub fn new(inner: Arc<dyn ParameterSource>) -> Self {
        Self {
            inner,
            values: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ParameterSource for MemoizedParameterSource {
    async fn get(&self, name: &str) -> AppResult<String> {
        if let Some(value) = self.values.read().await.get(name) {
            return Ok(value.clone());
        }

        let value = self.inner.get(name).await?;
        self.values
            .write()
            .await
            .insert(name.to_string(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn env_source_reports_missing_variable() {
        let source = EnvParameterSource;
        let err = source
            .get("USER_SERVICE_TEST_SURELY_UNSET_PARAMETER")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("USER_SERVICE_TEST_SURELY_UNSET_PARAMETER"));
    }

    #[tokio::test]
    async fn memoized_source_hits_inner_once() {
        let mut inner = MockParameterSource::new();
        inner
            .expect_get()
            .times(1)
            .returning(|_| Ok("alias/users".to_string()));

        let source = MemoizedParameterSource::new(Arc::new(inner));
        assert_eq!(source.get("/myapp/kms-key-id").await.unwrap(), "alias/users");
        assert_eq!(source.get("/myapp/kms-key-id").await.unwrap(), "alias/users");
    }

    #[tokio::test]
    async fn memoized_source_retries_failures() {
        let mut inner = MockParameterSource::new();
        let mut seq = mockall::Sequence::new();
        inner
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::external("throttled")));
        inner
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("alias/users".to_string()));

        let source = MemoizedParameterSource::new(Arc::new(inner));
        assert!(source.get("/myapp/kms-key-id").await.is_err());
        assert_eq!(source.get("/myapp/kms-key-id").await.unwrap(), "alias/users");
    }
}

//! Unified error handling.
//!
//! Provides a single error type for every layer of the user backend. The
//! transport layer is not part of this workspace; `http_status` exposes the
//! status code it is expected to map each error to.

use domain::DomainError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Validation
    #[error("{0}")]
    Validation(String),

    // External collaborators (identity provider, cipher, parameter source)
    #[error("{message}")]
    ExternalService {
        message: String,
        #[source]
        source: Option<Box<AppError>>,
    },

    // Infrastructure errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code the transport layer maps this error to
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::NotFound => 404,
            AppError::Validation(_) => 400,
            _ => 500,
        }
    }

    /// True when the error means "no matching record"
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound)
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::NotFound(_) => AppError::NotFound,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

#[cfg(feature = "cache")]
impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        AppError::Cache(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::Configuration(msg.into())
    }

    /// External collaborator failure without an upstream cause
    pub fn external(message: impl Into<String>) -> Self {
        AppError::ExternalService {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an upstream failure, keeping it only as the diagnostic source
    pub fn external_from(message: impl Into<String>, source: AppError) -> Self {
        AppError::ExternalService {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::NotFound.http_status(), 404);
        assert_eq!(AppError::validation("missing").http_status(), 400);
        assert_eq!(AppError::external("down").http_status(), 500);
        assert_eq!(AppError::cache("refused").http_status(), 500);
    }

    #[test]
    fn external_keeps_source_for_diagnostics() {
        let err = AppError::external_from("Registration failed", AppError::cache("refused"));
        assert_eq!(err.to_string(), "Registration failed");
        assert_eq!(err.source().map(|s| s.to_string()), Some("Cache error: refused".to_string()));
    }

    #[test]
    fn domain_errors_convert() {
        let err: AppError = DomainError::validation("Missing required fields").into();
        assert!(matches!(err, AppError::Validation(_)));
        let err: AppError = DomainError::not_found("User").into();
        assert!(err.is_not_found());
    }

    #[test]
    fn option_ext() {
        let none: Option<u8> = None;
        assert!(none.ok_or_not_found().unwrap_err().is_not_found());
        assert_eq!(Some(3).ok_or_not_found().unwrap(), 3);
    }
}

//! User service configuration.

use std::env;

use common::{AppEnv, CacheConfig, DatabaseConfig};
use domain::{DEFAULT_CACHE_TTL_SECONDS, DEFAULT_KMS_KEY_ID_PARAMETER};

/// User service configuration.
#[derive(Debug, Clone)]
pub struct UserServiceConfig {
    /// Deployment environment
    pub env: AppEnv,
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Redis cache settings
    pub cache: CacheConfig,
    /// Name of the parameter holding the secret-encryption key id
    pub kms_key_id_parameter: String,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            env: env::var("APP_ENV")
                .map(|v| AppEnv::parse(&v))
                .unwrap_or(defaults.env),
            database: DatabaseConfig {
                url: env::var("USER_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.database.max_connections),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.database.min_connections),
            },
            cache: CacheConfig {
                url: env::var("USER_SERVICE_REDIS_URL")
                    .or_else(|_| env::var("REDIS_URL"))
                    .unwrap_or(defaults.cache.url),
                url_parameter: env::var("REDIS_URL_PARAMETER").ok(),
                default_ttl_seconds: env::var("CACHE_DEFAULT_TTL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_CACHE_TTL_SECONDS),
            },
            kms_key_id_parameter: env::var("KMS_KEY_ID_PARAMETER")
                .unwrap_or(defaults.kms_key_id_parameter),
        }
    }
}

impl Default for UserServiceConfig {
    fn default() -> Self {
        Self {
            env: AppEnv::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            kms_key_id_parameter: DEFAULT_KMS_KEY_ID_PARAMETER.to_string(),
        }
    }
}

//! User Service Library
//!
//! User management backend: a cache-aside repository over the users table,
//! the registration saga, password reset and authentication flows. The
//! identity provider, cipher and remote parameter service are consumed
//! through the contracts in [`clients`].

pub mod clients;
pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;

use crate::clients::{EnvParameterSource, MemoizedParameterSource, ParameterSource};
use crate::config::UserServiceConfig;
use crate::infra::{init_cache, Database};
use crate::repository::{PersistentStore, SeaOrmUserStore};

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = UserServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Bootstrap the shared cache and the database, then verify both respond.
///
/// Fails fast on the first unreachable dependency.
pub async fn check() -> Result<(), Box<dyn std::error::Error>> {
    let config = UserServiceConfig::from_env();
    info!(env = ?config.env, "Checking user service dependencies");

    let params: Arc<dyn ParameterSource> =
        Arc::new(MemoizedParameterSource::new(Arc::new(EnvParameterSource)));

    let cache = init_cache(&config, params.as_ref()).await?;
    cache.set("user-service:check", "ok", 5).await?;
    cache.delete("user-service:check").await?;
    info!("Cache reachable");

    let db = Database::connect_without_migrations(&config.database).await?;
    db.ping().await?;
    let users = SeaOrmUserStore::new(db.get_connection()).count().await?;
    info!(users, "Database reachable");

    match params.get(&config.kms_key_id_parameter).await {
        Ok(_) => info!(parameter = %config.kms_key_id_parameter, "Encryption key id resolved"),
        Err(e) => tracing::warn!(parameter = %config.kms_key_id_parameter, error = %e, "Encryption key id unavailable"),
    }

    Ok(())
}

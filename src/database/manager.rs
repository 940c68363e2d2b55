use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::auth::password::{self, PasswordError};
use crate::config::{AppConfig, ConfigError, StorageBackend};
use crate::database::memory::MemoryStorage;
use crate::database::postgres::PgStorage;
use crate::database::storage::{Storage, StorageError};

/// Login for the seeded demo account
pub const SAMPLE_USERNAME: &str = "farmer1";
pub const SAMPLE_PASSWORD: &str = "password123";

/// Errors raised while bringing a storage backend up
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to hash sample password: {0}")]
    Seed(#[from] PasswordError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open a Postgres pool sized from configuration.
pub async fn connect_pool(config: &AppConfig) -> Result<PgPool, DatabaseError> {
    let url = config.database_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connection_timeout))
        .connect(url)
        .await?;

    info!(
        "Created database pool (max {} connections)",
        config.database.max_connections
    );
    Ok(pool)
}

/// Build the backend selected by `config.storage.backend`.
///
/// Postgres runs pending migrations when `database.run_migrations` is set.
/// The memory backend is seeded with the demo farm when
/// `storage.seed_sample_data` is set.
pub async fn build_storage(config: &AppConfig) -> Result<Arc<dyn Storage>, DatabaseError> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let storage = PgStorage::new(connect_pool(config).await?);
            if config.database.run_migrations {
                storage.migrate().await?;
            }
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            let storage = MemoryStorage::new();
            if config.storage.seed_sample_data {
                let hash =
                    password::hash_password(SAMPLE_PASSWORD, config.security.bcrypt_cost).await?;
                storage.seed_sample_data(hash).await?;
                info!(
                    "Sample account available: {} / {}",
                    SAMPLE_USERNAME, SAMPLE_PASSWORD
                );
            }
            Ok(Arc::new(storage))
        }
    }
}

/// Apply migrations and exit; used by the `migrate` subcommand.
pub async fn run_migrations(config: &AppConfig) -> Result<(), DatabaseError> {
    let storage = PgStorage::new(connect_pool(config).await?);
    storage.migrate().await?;
    storage.pool().close().await;
    Ok(())
}

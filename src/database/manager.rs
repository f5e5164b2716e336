use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::database::directory::UserDirectory;
use crate::database::memory::MemoryUserDirectory;
use crate::database::postgres::PgUserDirectory;

/// Errors from the user directory backends
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the directory backend selected by configuration
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a PostgreSQL pool using the configured URL and limits
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// PostgreSQL when `DATABASE_URL` is configured, in-memory otherwise.
    /// The PostgreSQL schema is created on open.
    pub async fn open_directory(config: &DatabaseConfig) -> Result<Arc<dyn UserDirectory>, DatabaseError> {
        if config.url.is_none() {
            warn!("DATABASE_URL not set, using in-memory user directory (data is lost on exit)");
            return Ok(Arc::new(MemoryUserDirectory::new()));
        }

        let pool = Self::connect(config).await?;
        let directory = PgUserDirectory::new(pool);
        directory.ensure_schema().await?;
        Ok(Arc::new(directory))
    }
}

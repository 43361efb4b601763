use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;
use crate::error::StoreError;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    /// `None` when no database is configured.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Option<Self>, StoreError> {
        match &config.url {
            Some(url) => Ok(Some(Self::new(url, config.max_connections).await?)),
            None => Ok(None),
        }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Postgres-backed implementation of every repository and of
/// `TransactionalStore`.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: Pool<Postgres>,
    pub(crate) lock_timeout: Duration,
}

impl PgStore {
    pub fn new(db: DbClient, lock_timeout: Duration) -> Self {
        Self {
            pool: db.pool,
            lock_timeout,
        }
    }
}

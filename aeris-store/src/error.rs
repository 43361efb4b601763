use aeris_core::CoreError;

/// Failures while bringing the storage side channels up.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

const LOCK_NOT_AVAILABLE: &str = "55P03";
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Translate a driver error into the domain taxonomy.
pub(crate) fn map_sqlx(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::RowNotFound => CoreError::NotFound(err.to_string()),
        sqlx::Error::PoolTimedOut => CoreError::Timeout("database connection pool exhausted".to_string()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(LOCK_NOT_AVAILABLE) => CoreError::Timeout(format!("lock wait aborted: {}", db.message())),
            Some(UNIQUE_VIOLATION) => CoreError::Conflict(db.message().to_string()),
            Some(CHECK_VIOLATION) | Some(FOREIGN_KEY_VIOLATION) => {
                CoreError::Conflict(db.message().to_string())
            }
            _ => CoreError::StorageError(err.to_string()),
        },
        _ => CoreError::StorageError(err.to_string()),
    }
}

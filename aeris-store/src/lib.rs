pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod error;
pub mod events;
pub mod flight_repo;
pub mod memory;
pub mod redis_repo;
mod rows;
pub mod transaction;
pub mod user_repo;

pub use app_config::Config;
pub use database::{DbClient, PgStore};
pub use error::StoreError;
pub use events::EventProducer;
pub use memory::InMemoryStore;
pub use redis_repo::RedisClient;

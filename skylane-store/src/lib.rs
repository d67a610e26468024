pub mod app_config;
pub mod database;
pub mod memory;
pub mod postgres;
pub mod redis_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use postgres::{PostgresBookingRepository, PostgresFlightRepository, PostgresUserRepository};
pub use redis_repo::RedisClient;

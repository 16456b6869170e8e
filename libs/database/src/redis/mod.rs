//! Redis connector and health checks

mod config;
mod connector;
mod health;

pub use config::RedisConfig;
pub use connector::{connect, connect_from_config_with_retry, open_client};
pub use health::{HealthStatus, check_health, check_health_detailed};

pub use redis::aio::ConnectionManager;
pub use redis::{Client, RedisResult};

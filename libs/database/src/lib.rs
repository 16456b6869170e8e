//! Connectors and shared utilities for the journal's backing stores.
//!
//! # Features
//!
//! - `redis` (default) - Redis connection manager, pub/sub client and health checks
//! - `mongodb` - MongoDB client, database handle and ping-based health checks
//! - `config` - `core_config::FromEnv` implementations for the store configs
//! - `all` - everything above
//!
//! # Examples
//!
//! ## Redis
//!
//! ```ignore
//! use database::redis::{RedisConfig, connect_from_config_with_retry};
//!
//! let config = RedisConfig::from_env()?;
//! let manager = connect_from_config_with_retry(&config, None).await?;
//! ```
//!
//! ## MongoDB
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};

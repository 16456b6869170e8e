use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use super::RedisConfig;
use crate::common::{DatabaseError, RetryConfig, retry_with_backoff};

/// Opens a client without connecting; pub/sub connections are made from it on demand.
pub fn open_client(config: &RedisConfig) -> Result<Client, DatabaseError> {
    Ok(Client::open(config.url.as_str())?)
}

/// Connects a [`ConnectionManager`] and verifies it with `PING`.
///
/// The manager reconnects on its own after the initial handshake.
pub async fn connect(config: &RedisConfig) -> Result<ConnectionManager, DatabaseError> {
    info!("Connecting to Redis");

    let client = open_client(config)?;
    let manager = ConnectionManager::new(client).await?;

    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Connected to Redis");
    Ok(manager)
}

/// [`connect`] retried with backoff; `None` uses [`RetryConfig::default`].
pub async fn connect_from_config_with_retry(
    config: &RedisConfig,
    retry_config: Option<RetryConfig>,
) -> Result<ConnectionManager, DatabaseError> {
    retry_with_backoff(|| connect(config), retry_config.unwrap_or_default()).await
}

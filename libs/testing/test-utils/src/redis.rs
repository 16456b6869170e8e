//! Redis container for pub/sub tests

use redis::Client;
use redis::aio::MultiplexedConnection;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::redis::Redis;

/// Throwaway Redis. The container is stopped and removed on drop.
///
/// ```no_run
/// use test_utils::TestRedis;
///
/// # async fn example() {
/// let redis = TestRedis::new().await;
/// let client = redis.client();
/// let mut pubsub = client.get_async_pubsub().await.unwrap();
/// pubsub.subscribe("events").await.unwrap();
/// # }
/// ```
pub struct TestRedis {
    #[allow(dead_code)]
    container: ContainerAsync<Redis>,
    connection: MultiplexedConnection,
    pub connection_string: String,
    pub host: String,
    pub port: u16,
}

impl TestRedis {
    /// Start Redis 8 Alpine and wait until it answers.
    pub async fn new() -> Self {
        let container = Redis::default()
            .with_tag("8-alpine")
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        let host = "127.0.0.1".to_string();
        let connection_string = format!("redis://{}:{}", host, port);

        let connection = Client::open(connection_string.clone())
            .expect("Failed to create Redis client")
            .get_multiplexed_async_connection()
            .await
            .expect("Failed to connect to Redis");

        tracing::info!(port, "Test Redis ready (Redis 8-alpine)");

        Self {
            container,
            connection,
            connection_string,
            host,
            port,
        }
    }

    /// Multiplexed connection for `PUBLISH` and other commands.
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Fresh client, e.g. for opening a dedicated pub/sub connection.
    pub fn client(&self) -> Client {
        Client::open(self.connection_string.clone()).expect("Failed to create Redis client")
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl Drop for TestRedis {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Redis container");
    }
}

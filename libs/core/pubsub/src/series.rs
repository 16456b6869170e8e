//! Per-event-type activity counters kept as Redis time series.
//!
//! Each published event adds a sample of `1` to `events:<type>`, so the last
//! day of activity per type can be ranged over with `TS.RANGE`. Requires the
//! RedisTimeSeries commands (bundled with Redis 8).

use crate::error::PubSubError;
use async_trait::async_trait;
use database::redis::ConnectionManager;
use redis::Cmd;
use std::time::Duration;
use tracing::debug;

/// Key prefix for per-type series.
pub const SERIES_PREFIX: &str = "events:";

/// Samples older than a day are dropped by the server.
pub const SERIES_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

pub fn series_key(event_type: &str) -> String {
    format!("{}{}", SERIES_PREFIX, event_type)
}

/// Records that an event of some type happened.
#[async_trait]
pub trait EventSeries: Send + Sync {
    /// Add one sample for `event_type` at the server's clock.
    async fn record(&self, event_type: &str) -> Result<(), PubSubError>;
}

/// `TS.ADD events:<type> * 1` over a multiplexed Redis connection.
///
/// The key is created with the retention on first use. Servers that refuse
/// to auto-create on `TS.ADD` get an explicit `TS.CREATE` and one retry.
#[derive(Clone)]
pub struct RedisEventSeries {
    conn: ConnectionManager,
    retention: Duration,
}

impl RedisEventSeries {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            retention: SERIES_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    fn retention_ms(&self) -> u64 {
        self.retention.as_millis() as u64
    }
}

fn add_cmd(key: &str, retention_ms: Option<u64>) -> Cmd {
    let mut cmd = redis::cmd("TS.ADD");
    cmd.arg(key).arg("*").arg(1);
    if let Some(ms) = retention_ms {
        cmd.arg("RETENTION").arg(ms);
    }
    cmd
}

fn create_cmd(key: &str, retention_ms: u64) -> Cmd {
    let mut cmd = redis::cmd("TS.CREATE");
    cmd.arg(key).arg("RETENTION").arg(retention_ms);
    cmd
}

fn is_missing_key(message: &str) -> bool {
    message.contains("key does not exist")
}

#[async_trait]
impl EventSeries for RedisEventSeries {
    async fn record(&self, event_type: &str) -> Result<(), PubSubError> {
        let key = series_key(event_type);
        let mut conn = self.conn.clone();

        let added: Result<i64, redis::RedisError> = add_cmd(&key, Some(self.retention_ms()))
            .query_async(&mut conn)
            .await;
        match added {
            Ok(_) => Ok(()),
            Err(e) if is_missing_key(&e.to_string()) => {
                debug!(key, "Creating event series");
                let _: () = create_cmd(&key, self.retention_ms())
                    .query_async(&mut conn)
                    .await?;
                let _: i64 = add_cmd(&key, None).query_async(&mut conn).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

//! Fire-and-forget event publishing

use crate::error::PubSubError;
use crate::event::Event;
use async_trait::async_trait;
use database::redis::ConnectionManager;
use tracing::debug;

/// Sends events to a channel. Delivery is best-effort: an event published
/// while nobody is subscribed is gone.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), PubSubError>;
}

/// `PUBLISH` over a multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: ConnectionManager,
}

impl RedisEventPublisher {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), PubSubError> {
        let payload = event.encode()?;
        let mut conn = self.conn.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        debug!(
            channel,
            event_type = %event.event_type,
            receivers,
            "Published event"
        );
        Ok(())
    }
}

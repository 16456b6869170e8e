//! Transport seam between the subscriber state machine and the broker

use crate::error::PubSubError;
use async_trait::async_trait;
use database::redis::{Client, RedisConfig, open_client};
use futures::StreamExt;

/// One message as delivered by the broker, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub channel: String,
    pub payload: Vec<u8>,
}

impl RawMessage {
    pub fn new(channel: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

/// Opens fresh pub/sub connections.
#[async_trait]
pub trait PubSubTransport: Send + Sync {
    type Connection: PubSubConnection;

    async fn connect(&self) -> Result<Self::Connection, PubSubError>;
}

/// A single live pub/sub connection.
#[async_trait]
pub trait PubSubConnection: Send {
    /// Issue `SUBSCRIBE channel`.
    async fn subscribe(&mut self, channel: &str) -> Result<(), PubSubError>;

    /// Next message on any subscribed channel; `None` once the connection is closed.
    async fn next_message(&mut self) -> Option<RawMessage>;
}

/// Redis-backed transport. Each `connect` opens a dedicated pub/sub connection.
#[derive(Clone)]
pub struct RedisTransport {
    client: Client,
}

impl RedisTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &RedisConfig) -> Result<Self, PubSubError> {
        Ok(Self::new(open_client(config)?))
    }
}

#[async_trait]
impl PubSubTransport for RedisTransport {
    type Connection = RedisConnection;

    async fn connect(&self) -> Result<RedisConnection, PubSubError> {
        let pubsub = self.client.get_async_pubsub().await?;
        Ok(RedisConnection { pubsub })
    }
}

pub struct RedisConnection {
    pubsub: redis::aio::PubSub,
}

#[async_trait]
impl PubSubConnection for RedisConnection {
    async fn subscribe(&mut self, channel: &str) -> Result<(), PubSubError> {
        self.pubsub.subscribe(channel).await?;
        Ok(())
    }

    async fn next_message(&mut self) -> Option<RawMessage> {
        let msg = self.pubsub.on_message().next().await?;
        Some(RawMessage::new(
            msg.get_channel_name(),
            msg.get_payload_bytes(),
        ))
    }
}

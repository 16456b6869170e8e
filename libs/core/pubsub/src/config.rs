//! Subscriber configuration

use crate::policy::ReconnectPolicy;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use std::time::Duration;

/// Channel the data pipeline publishes lifecycle events on.
pub const DEFAULT_CHANNEL: &str = "events";

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Pub/sub channel to follow
    pub channel: String,

    /// Decoded events buffered between the reader and the handler
    pub buffer: usize,

    pub reconnect: ReconnectPolicy,
}

impl SubscriberConfig {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Self::default()
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            buffer: 1024,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Environment variables:
/// - `EVENTS_CHANNEL` (default: events)
/// - `EVENTS_BUFFER` (default: 1024)
/// - `RECONNECT_INITIAL_MS` (default: 50)
/// - `RECONNECT_MAX_MS` (default: 2000)
impl FromEnv for SubscriberConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let channel = env_or_default("EVENTS_CHANNEL", DEFAULT_CHANNEL);
        let buffer: usize = env_parse("EVENTS_BUFFER", "1024")?;
        let initial_ms: u64 = env_parse("RECONNECT_INITIAL_MS", "50")?;
        let max_ms: u64 = env_parse("RECONNECT_MAX_MS", "2000")?;

        Ok(Self::new(channel)
            .with_buffer(buffer)
            .with_reconnect(ReconnectPolicy::new(
                Duration::from_millis(initial_ms),
                Duration::from_millis(max_ms.max(initial_ms)),
            )))
    }
}

//! Event bus error types

use thiserror::Error;

/// Transport and publishing failures
#[derive(Error, Debug)]
pub enum PubSubError {
    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Connector error (bad URL, failed handshake)
    #[error("Connection error: {0}")]
    Connection(#[from] database::DatabaseError),

    /// Event could not be encoded for publishing
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why an inbound message was dropped
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Not JSON, or not the `{type, payload, timestamp, service}` shape
    #[error("malformed event JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Right shape, but a field is empty
    #[error("invalid event: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    /// `timestamp` does not correspond to a representable instant
    #[error("timestamp {0} is out of range")]
    Timestamp(i64),
}

/// Failure reported by an [`EventHandler`](crate::EventHandler).
///
/// The subscriber only logs these, so a message is all it carries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

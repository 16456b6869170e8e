//! Wire model for bus messages

use crate::error::DecodeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Type tags emitted by the data pipeline.
///
/// Not an allow-list: any non-empty `type` is accepted on ingest.
pub mod event_types {
    pub const DATA_FETCH_STARTED: &str = "data.fetch.started";
    pub const DATA_FETCH_COMPLETED: &str = "data.fetch.completed";
    pub const DATA_FETCH_FAILED: &str = "data.fetch.failed";
    pub const DATA_UPLOAD_STARTED: &str = "data.upload.started";
    pub const DATA_UPLOAD_COMPLETED: &str = "data.upload.completed";
    pub const DATA_UPLOAD_FAILED: &str = "data.upload.failed";
    pub const DATA_SEARCH_STARTED: &str = "data.search.started";
    pub const DATA_SEARCH_COMPLETED: &str = "data.search.completed";
    pub const DATA_SEARCH_FAILED: &str = "data.search.failed";
}

/// A fact published by a producer. Immutable once published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Event {
    /// Dotted tag such as `data.fetch.completed`
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub event_type: String,

    /// Free-form details; must be a JSON object
    pub payload: Map<String, Value>,

    /// Producer clock, milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Origin identifier, e.g. `data-pipeline`
    #[validate(length(min = 1))]
    pub service: String,
}

impl Event {
    /// New event stamped with the current time.
    pub fn new(
        event_type: impl Into<String>,
        service: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp: Utc::now().timestamp_millis(),
            service: service.into(),
        }
    }

    /// Decodes and validates a raw bus payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let event: Event = serde_json::from_slice(bytes)?;
        event.validate()?;
        if event.occurred_at().is_none() {
            return Err(DecodeError::Timestamp(event.timestamp));
        }
        Ok(event)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Producer timestamp as an instant; `None` only for events that were
    /// built by hand with an out-of-range timestamp.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

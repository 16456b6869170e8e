//! Bus-to-store bridge

use crate::models::NewLogEntry;
use crate::store::LogStore;
use async_trait::async_trait;
use pubsub::{Event, EventHandler, HandlerError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Appends every received event to the journal.
///
/// Errors are returned to the subscriber, which logs and drops them; an
/// event that fails to store is not retried.
pub struct LogStoreHandler<S> {
    store: Arc<S>,
}

impl<S: LogStore> LogStoreHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: LogStore + 'static> EventHandler for LogStoreHandler<S> {
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        let entry = NewLogEntry::from_event(event).map_err(|e| HandlerError::new(e.to_string()))?;

        match self.store.append(entry).await {
            Ok(stored) => {
                debug!(id = %stored.id, event_type = %stored.event_type, service = %stored.service, "Stored event");
                Ok(())
            }
            Err(e) => {
                if e.is_unavailable() {
                    warn!(event_type = %event.event_type, "Log store unavailable, event not stored");
                }
                Err(HandlerError::new(e.to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_store"
    }
}

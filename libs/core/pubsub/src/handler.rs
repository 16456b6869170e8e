use crate::{Event, HandlerError};
use async_trait::async_trait;
use std::sync::Arc;

/// Receives every decoded event of a subscription.
///
/// Calls are sequential and in arrival order. Returned errors are logged and
/// counted by the subscriber, then dropped; there is no redelivery.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> Result<(), HandlerError>;

    /// Used for logging and metrics labels.
    fn name(&self) -> &'static str {
        "event_handler"
    }
}

#[async_trait]
impl<H: EventHandler + ?Sized> EventHandler for Arc<H> {
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        (**self).handle(event).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

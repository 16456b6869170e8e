//! Event bus over Redis pub/sub.
//!
//! ## Pieces
//!
//! - [`Event`]: the JSON message producers publish (`{type, payload, timestamp, service}`)
//! - [`EventSubscriber`]: reconnecting subscriber that decodes messages and hands them,
//!   one at a time and in arrival order, to an [`EventHandler`]
//! - [`ReconnectPolicy`]: backoff between connection attempts; never gives up
//! - [`EventPublisher`]: `PUBLISH` side used by producers
//! - [`EventSeries`]: per-type `events:<type>` time series with one day of retention
//!
//! Delivery is at-least-once from the subscriber's point of view and fire-and-forget:
//! malformed messages and handler failures are logged, counted and dropped.
//!
//! ## Example
//!
//! ```ignore
//! use pubsub::{EventSubscriber, RedisTransport, SubscriberConfig};
//!
//! let config = SubscriberConfig::from_env()?;
//! let transport = RedisTransport::from_config(&redis_config)?;
//! let handle = EventSubscriber::new(transport, config).subscribe(handler);
//!
//! // ... on teardown
//! handle.shutdown().await;
//! ```

mod config;
mod error;
mod event;
mod handler;
pub mod metrics;
mod policy;
mod publisher;
mod series;
mod state;
mod subscriber;
mod transport;

pub use config::{DEFAULT_CHANNEL, SubscriberConfig};
pub use error::{DecodeError, HandlerError, PubSubError};
pub use event::{Event, event_types};
pub use handler::EventHandler;
pub use metrics::{init_metrics, render_metrics};
pub use policy::ReconnectPolicy;
pub use publisher::{EventPublisher, RedisEventPublisher};
pub use series::{EventSeries, RedisEventSeries, SERIES_PREFIX, SERIES_RETENTION, series_key};
pub use state::SubscriberState;
pub use subscriber::{EventSubscriber, SubscriberHandle};
pub use transport::{PubSubConnection, PubSubTransport, RawMessage, RedisConnection, RedisTransport};

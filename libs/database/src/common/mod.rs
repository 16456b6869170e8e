//! Utilities shared by every connector

pub mod error;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{RetryConfig, apply_jitter, backoff_delay_ms, retry, retry_with_backoff};

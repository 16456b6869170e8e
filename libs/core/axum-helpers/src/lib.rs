//! # Axum Helpers
//!
//! Shared HTTP plumbing for the journal and data-pipeline services.
//!
//! - **[`errors`]**: [`AppError`] and the `{code, error, message}` JSON error body
//! - **[`server`]**: router setup, `/health`, `/ready` aggregation, `/metrics`,
//!   graceful shutdown
//!
//! Domain crates convert their error enums into [`AppError`] and own their
//! routers; binaries merge those routers and hand them to [`create_app`].

pub mod errors;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use server::{
    HealthCheckFuture, HealthResponse, MetricsRender, create_app, create_router, health_router,
    metrics_router, run_health_checks, serve_until, shutdown_signal,
};

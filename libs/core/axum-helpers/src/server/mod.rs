//! HTTP server plumbing: startup, health and metrics endpoints, shutdown.
//!
//! ```ignore
//! use axum_helpers::server::{create_app, create_router, health_router};
//! use core_config::{app_info, server::ServerConfig};
//!
//! let app = create_router(api_routes.merge(health_router(app_info!())));
//! create_app(app, &ServerConfig::from_env_with_port(5002)?).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_app, create_router, serve_until};
pub use health::{
    HealthCheckFuture, HealthResponse, MetricsRender, health_router, metrics_router,
    run_health_checks,
};
pub use shutdown::shutdown_signal;

use crate::errors::handlers::not_found;
use axum::Router;
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// Wraps routes with request tracing and a JSON 404 fallback.
///
/// Routers passed in should already have their state applied.
pub fn create_router(routes: Router) -> Router {
    routes.fallback(not_found).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Serves `router` until Ctrl+C or SIGTERM.
///
/// ```ignore
/// let config = ServerConfig::from_env_with_port(5002)?;
/// create_app(create_router(routes), &config).await?;
/// ```
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    serve_until(router, server_config, super::shutdown::shutdown_signal()).await
}

/// Serves `router` until `shutdown` resolves, then drains in-flight requests.
pub async fn serve_until<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server starting on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        })?;

    info!("Server stopped");
    Ok(())
}

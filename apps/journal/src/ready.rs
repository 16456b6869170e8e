//! `/ready`: store and Redis pinged concurrently

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use axum_helpers::{HealthCheckFuture, run_health_checks};
use database::redis::{ConnectionManager, check_health};
use domain_journal::{JournalService, LogStore};
use std::sync::Arc;

type ReadyState<S> = (Arc<JournalService<S>>, ConnectionManager);

pub fn ready_router<S: LogStore + 'static>(
    service: Arc<JournalService<S>>,
    redis: ConnectionManager,
) -> Router {
    Router::new()
        .route("/ready", get(ready::<S>))
        .with_state((service, redis))
}

async fn ready<S: LogStore + 'static>(
    State((service, mut redis)): State<ReadyState<S>>,
) -> impl IntoResponse {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![
        (
            "mongodb",
            Box::pin(async { service.ping().await.map_err(|e| e.to_string()) }),
        ),
        (
            "redis",
            Box::pin(async move { check_health(&mut redis).await.map_err(|e| e.to_string()) }),
        ),
    ];
    run_health_checks(checks).await
}

//! `/ready`: MongoDB and Redis pinged concurrently

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use axum_helpers::{HealthCheckFuture, run_health_checks};
use database::redis::{ConnectionManager, check_health};
use domain_data::{DataRepository, DataService};
use std::sync::Arc;

type ReadyState<R> = (Arc<DataService<R>>, ConnectionManager);

pub fn ready_router<R: DataRepository + 'static>(
    service: Arc<DataService<R>>,
    redis: ConnectionManager,
) -> Router {
    Router::new()
        .route("/ready", get(ready::<R>))
        .with_state((service, redis))
}

async fn ready<R: DataRepository + 'static>(
    State((service, mut redis)): State<ReadyState<R>>,
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

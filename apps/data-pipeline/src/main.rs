use axum::Router;
use axum_helpers::{create_app, create_router, health_router, metrics_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_data::{DataService, MongoDataRepository, data_router};
use pubsub::{RedisEventPublisher, RedisEventSeries};
use std::sync::Arc;
use tracing::{info, warn};

mod config;
mod ready;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    pubsub::init_metrics();

    let client = database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = client.database(config.mongodb.database());
    let redis = database::redis::connect_from_config_with_retry(&config.redis, None).await?;

    let repository = MongoDataRepository::new(&db);
    if let Err(e) = repository.create_indexes().await {
        warn!(error = %e, "Could not ensure text index on data collection");
    }

    let publisher = Arc::new(RedisEventPublisher::new(redis.clone()));
    let series = Arc::new(RedisEventSeries::new(redis.clone()));
    let service = Arc::new(
        DataService::new(Arc::new(repository))
            .with_publisher(publisher, config.events_channel.clone())
            .with_series(series),
    );

    let routes = Router::new()
        .merge(data_router::<MongoDataRepository>().with_state(service.clone()))
        .merge(ready::ready_router(service, redis))
        .merge(health_router(config.app))
        .merge(metrics_router(pubsub::render_metrics));

    info!(channel = %config.events_channel, "Starting data pipeline");
    create_app(create_router(routes), &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Data pipeline shutdown complete");
    Ok(())
}

use axum::Router;
use axum_helpers::{create_app, create_router, health_router, metrics_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::redis::ConnectionManager;
use domain_journal::{
    InMemoryLogStore, JournalService, LogStore, LogStoreHandler, MongoLogStore, logs_router,
};
use pubsub::{EventSubscriber, RedisTransport};
use std::sync::Arc;
use tracing::{info, warn};

mod config;
mod ready;

use config::{Config, StoreBackend};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    pubsub::init_metrics();

    info!(store = %config.store, channel = %config.subscriber.channel, "Starting journal");

    let redis = database::redis::connect_from_config_with_retry(&config.redis, None).await?;

    match config.store {
        StoreBackend::Mongo => {
            let client =
                database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
            let db = client.database(config.mongodb.database());
            let store = MongoLogStore::new(&db);
            store.create_indexes().await?;
            info!(database = %config.mongodb.database(), "Log store ready");
            run(config, Arc::new(store), redis).await
        }
        StoreBackend::Memory => {
            warn!("Using in-memory log store; entries are lost on restart");
            run(config, Arc::new(InMemoryLogStore::new()), redis).await
        }
    }
}

async fn run<S: LogStore + 'static>(
    config: Config,
    store: Arc<S>,
    redis: ConnectionManager,
) -> eyre::Result<()> {
    let transport = RedisTransport::from_config(&config.redis)?;
    let handler = Arc::new(LogStoreHandler::new(store.clone()));
    let subscription =
        EventSubscriber::new(transport, config.subscriber.clone()).subscribe(handler);

    let service = Arc::new(JournalService::new(store));
    let routes = Router::new()
        .merge(logs_router::<S>().with_state(service.clone()))
        .merge(ready::ready_router(service, redis))
        .merge(health_router(config.app))
        .merge(metrics_router(pubsub::render_metrics));

    let served = create_app(create_router(routes), &config.server).await;

    info!("HTTP server stopped, draining subscriber");
    subscription.shutdown().await;

    served.map_err(|e| eyre::eyre!("Server error: {}", e))?;
    info!("Journal shutdown complete");
    Ok(())
}

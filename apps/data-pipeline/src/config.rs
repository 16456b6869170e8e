use core_config::{AppInfo, FromEnv, app_info, env_or_default, server::ServerConfig};
use database::mongodb::MongoConfig;
use database::redis::RedisConfig;
use pubsub::DEFAULT_CHANNEL;

pub use core_config::Environment;

const DEFAULT_PORT: u16 = 5001;

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub redis: RedisConfig,
    /// Channel lifecycle events are published on (`EVENTS_CHANNEL`)
    pub events_channel: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env_with_port(DEFAULT_PORT)?,
            mongodb: MongoConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            events_channel: env_or_default("EVENTS_CHANNEL", DEFAULT_CHANNEL),
        })
    }
}

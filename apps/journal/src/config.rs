use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, server::ServerConfig};
use database::mongodb::MongoConfig;
use database::redis::RedisConfig;
use pubsub::SubscriberConfig;
use std::str::FromStr;

pub use core_config::Environment;

const DEFAULT_PORT: u16 = 5002;

/// Where log entries are kept
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    Mongo,
    /// Process memory; entries are lost on restart
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub redis: RedisConfig,
    pub subscriber: SubscriberConfig,
}

impl Config {
    /// `JOURNAL_STORE` selects the backend (`mongo` or `memory`, default `mongo`).
    pub fn from_env() -> eyre::Result<Self> {
        let raw_store = env_or_default("JOURNAL_STORE", "mongo");
        let store = StoreBackend::from_str(&raw_store).map_err(|e| ConfigError::ParseError {
            key: "JOURNAL_STORE".to_string(),
            details: format!("'{}': {}", raw_store, e),
        })?;

        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env_with_port(DEFAULT_PORT)?,
            store,
            mongodb: MongoConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            subscriber: SubscriberConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("PORT", None::<&str>),
                ("JOURNAL_STORE", None),
                ("EVENTS_CHANNEL", None),
                ("REDIS_URL", Some("redis://localhost:6379")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.server.port, 5002);
                assert_eq!(config.store, StoreBackend::Mongo);
                assert_eq!(config.subscriber.channel, "events");
                assert_eq!(config.app.name, "journal");
            },
        );
    }

    #[test]
    fn test_memory_store_selected() {
        temp_env::with_vars([("JOURNAL_STORE", Some("Memory"))], || {
            assert_eq!(Config::from_env().unwrap().store, StoreBackend::Memory);
        });
    }

    #[test]
    fn test_unknown_store_rejected() {
        temp_env::with_vars([("JOURNAL_STORE", Some("postgres"))], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("JOURNAL_STORE"));
        });
    }
}

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};

/// MongoDB connection settings.
///
/// Built by hand or, with the `config` feature, from the environment.
///
/// ```ignore
/// let config = MongoConfig::with_database("mongodb://localhost:27017", "journal");
/// let config = MongoConfig::from_env()?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoConfig {
    /// Connection string: mongodb://[username:password@]host[:port][/database][?options]
    pub url: String,

    /// Database holding the `logs` and `data` collections
    pub database: String,

    /// Application name reported to the server
    pub app_name: Option<String>,

    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_database(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Builds a URL that authenticates against the `admin` database.
    pub fn from_parts(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: impl Into<String>,
    ) -> Self {
        let database = database.into();
        let url = format!("mongodb://{user}:{password}@{host}:{port}/{database}?authSource=admin");
        Self::with_database(url, database)
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            database: "test".to_string(),
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 10,
        }
    }
}

/// Environment variables:
/// - `MONGODB_URL` or `MONGO_URL` - full connection string; when both are unset the URL
///   is composed from `MONGODB_HOST` (mongodb), `MONGODB_PORT` (27017),
///   `MONGODB_USER` (admin) and `MONGODB_PASSWORD` (secret)
/// - `MONGODB_DATABASE` (default: test)
/// - `MONGODB_APP_NAME` (optional)
/// - `MONGODB_MAX_POOL_SIZE` (100), `MONGODB_MIN_POOL_SIZE` (5)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (10), `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (10)
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let database = env_or_default("MONGODB_DATABASE", "test");

        let mut config = match std::env::var("MONGODB_URL").or_else(|_| std::env::var("MONGO_URL")) {
            Ok(url) => Self::with_database(url, database),
            Err(_) => {
                let host = env_or_default("MONGODB_HOST", "mongodb");
                let port: u16 = env_parse("MONGODB_PORT", "27017")?;
                let user = env_or_default("MONGODB_USER", "admin");
                let password = env_or_default("MONGODB_PASSWORD", "secret");
                Self::from_parts(&host, port, &user, &password, database)
            }
        };

        config.app_name = std::env::var("MONGODB_APP_NAME").ok();
        config.max_pool_size = env_parse("MONGODB_MAX_POOL_SIZE", "100")?;
        config.min_pool_size = env_parse("MONGODB_MIN_POOL_SIZE", "5")?;
        config.connect_timeout_secs = env_parse("MONGODB_CONNECT_TIMEOUT_SECS", "10")?;
        config.server_selection_timeout_secs =
            env_parse("MONGODB_SERVER_SELECTION_TIMEOUT_SECS", "10")?;

        Ok(config)
    }
}

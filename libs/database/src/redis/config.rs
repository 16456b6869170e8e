#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};

/// Redis connection settings.
///
/// ```ignore
/// let config = RedisConfig::new("redis://127.0.0.1:6379");
/// let config = RedisConfig::from_env()?;
/// ```
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// Connection URL: redis://[:password@]host[:port][/db]
    pub url: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Builds a URL from discrete settings; an empty password is treated as none.
    pub fn from_parts(host: &str, port: u16, password: Option<&str>) -> Self {
        let url = match password.filter(|p| !p.is_empty()) {
            Some(password) => format!("redis://:{password}@{host}:{port}"),
            None => format!("redis://{host}:{port}"),
        };
        Self { url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379")
    }
}

/// Environment variables:
/// - `REDIS_URL` - full connection URL, takes precedence
/// - `REDIS_HOST` (localhost), `REDIS_PORT` (6379), `REDIS_PASSWORD` (optional)
#[cfg(feature = "config")]
impl FromEnv for RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var("REDIS_URL") {
            return Ok(Self::new(url));
        }

        let host = env_or_default("REDIS_HOST", "localhost");
        let port: u16 = env_parse("REDIS_PORT", "6379")?;
        let password = std::env::var("REDIS_PASSWORD").ok();

        Ok(Self::from_parts(&host, port, password.as_deref()))
    }
}

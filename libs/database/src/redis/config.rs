#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_required};

/// Location of the Redis instance carrying the notification stream.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(feature = "config")]
impl FromEnv for RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(env_required("REDIS_URL")?))
    }
}

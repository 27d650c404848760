use std::time::Duration;

use sea_orm::ConnectOptions;

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse, env_required};

/// Pool settings for the PostgreSQL connection.
///
/// ```ignore
/// use core_config::FromEnv;
/// use database::postgres::PostgresConfig;
///
/// let config = PostgresConfig::from_env()?;
/// let db = database::postgres::connect_from_config(config).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Echo every statement through tracing.
    pub sqlx_logging: bool,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_pool_size(mut self, max_connections: u32, min_connections: u32) -> Self {
        self.max_connections = max_connections;
        self.min_connections = min_connections.min(max_connections);
        self
    }

    pub fn into_connect_options(self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.url);
        options
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .sqlx_logging(self.sqlx_logging);
        options
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout_secs: 8,
            idle_timeout_secs: 300,
            sqlx_logging: false,
        }
    }
}

/// Reads `DATABASE_URL` (required) plus the optional `DB_*` pool knobs.
#[cfg(feature = "config")]
impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_connections = env_parse("DB_MAX_CONNECTIONS", defaults.max_connections)?;
        let min_connections = env_parse("DB_MIN_CONNECTIONS", defaults.min_connections)?;
        if min_connections > max_connections {
            return Err(ConfigError::Invalid {
                key: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!("must not exceed DB_MAX_CONNECTIONS ({max_connections})"),
            });
        }

        Ok(Self {
            url: env_required("DATABASE_URL")?,
            max_connections,
            min_connections,
            connect_timeout_secs: env_parse(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            idle_timeout_secs: env_parse("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs)?,
            sqlx_logging: env_parse("DB_SQL_LOGGING", defaults.sqlx_logging)?,
        })
    }
}


#[cfg(test)]
mod pool_tests {
    use super::*;

    #[test]
    fn min_connections_is_clamped_to_max() {
        let config = PostgresConfig::new("postgres://localhost/bazaar").with_pool_size(3, 10);
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.min_connections, 3);
    }
}

use axum_helpers::JwtConfig;
use core_config::{AppInfo, FromEnv, app_info, env_optional, server::ServerConfig};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;

pub use core_config::Environment;

/// Everything the API reads from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    /// Without `REDIS_URL` notifications are delivered in-process.
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let jwt = JwtConfig::from_env()?;
        let redis = env_optional("REDIS_URL").map(RedisConfig::new);

        Ok(Self {
            app: app_info!(),
            database,
            redis,
            jwt,
            server,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "config-test-secret-that-is-long-enough";

    #[test]
    fn redis_is_optional() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/bazaar")),
                ("JWT_SECRET", Some(SECRET)),
                ("REDIS_URL", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.redis.is_none());
                assert_eq!(config.app.name, "bazaar_api");
            },
        );
    }

    #[test]
    fn reads_redis_url_when_set() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/bazaar")),
                ("JWT_SECRET", Some(SECRET)),
                ("REDIS_URL", Some("redis://cache:6379")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.redis.unwrap().url, "redis://cache:6379");
            },
        );
    }

    #[test]
    fn database_url_is_required() {
        temp_env::with_vars(
            [("DATABASE_URL", None::<&str>), ("JWT_SECRET", Some(SECRET))],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}

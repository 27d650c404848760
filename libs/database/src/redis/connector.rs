use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use super::RedisConfig;
use crate::common::{RetryConfig, retry_with_backoff};

/// Open a reconnecting connection and confirm it with `PING`.
pub async fn connect(url: &str) -> redis::RedisResult<ConnectionManager> {
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Connected to Redis");
    Ok(manager)
}

pub async fn connect_from_config(config: RedisConfig) -> redis::RedisResult<ConnectionManager> {
    connect(&config.url).await
}

pub async fn connect_from_config_with_retry(
    config: RedisConfig,
    retry_config: Option<RetryConfig>,
) -> redis::RedisResult<ConnectionManager> {
    retry_with_backoff(|| connect(&config.url), retry_config.unwrap_or_default()).await
}

use redis::aio::ConnectionManager;
use tracing::debug;

use crate::common::DatabaseError;

pub async fn check_health(conn: &mut ConnectionManager) -> Result<(), DatabaseError> {
    let response: String = redis::cmd("PING")
        .query_async(conn)
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("redis: {e}")))?;

    if response != "PONG" {
        return Err(DatabaseError::HealthCheckFailed(format!(
            "redis: unexpected PING reply {response}"
        )));
    }

    debug!("Redis health check passed");
    Ok(())
}

//! Notification worker
//!
//! Consumes new-item notifications that the API publishes when
//! `REDIS_URL` is set, and hands each one to the delivery sink.
//!
//! ```text
//! Redis Stream (notifications:new_item)
//!   ↓ (Consumer Group: notification_workers)
//! StreamWorker<NewItemNotification, NotificationProcessor>
//!   ↓
//! LogSink
//! ```
//!
//! Delivery is best effort: a failed notification is logged, acknowledged
//! and dropped.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, ShutdownCoordinator, health_router, run_health_checks};
use core_config::{Environment, FromEnv, app_info, env_optional, env_parse};
use database::redis::{ConnectionManager, RedisConfig};
use domain_notifications::{LogSink, NewItemNotification, NotificationProcessor, NotificationStream};
use eyre::{Result, WrapErr};
use serde_json::Value;
use std::net::{Ipv4Addr, SocketAddr};
use stream_worker::{StreamWorker, WorkerConfig};
use tokio::net::TcpListener;
use tracing::{error, info};

const DEFAULT_HEALTH_PORT: u16 = 8082;

/// Consumer name that survives restarts, so entries left pending by a
/// crashed run are read again by its successor.
///
/// `NOTIFICATION_WORKER_CONSUMER_ID` wins over `HOSTNAME`; `None` keeps the
/// random per-process name.
fn stable_consumer_id() -> Option<String> {
    env_optional("NOTIFICATION_WORKER_CONSUMER_ID").or_else(|| {
        env_optional("HOSTNAME").map(|host| format!("notification-worker-{}", host.trim()))
    })
}

async fn ready_handler(State(redis): State<ConnectionManager>) -> (StatusCode, Json<Value>) {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "redis",
        Box::pin(async move {
            let mut redis = redis;
            database::redis::check_health(&mut redis)
                .await
                .map_err(|e| e.to_string())
        }),
    )];
    run_health_checks(checks).await
}

/// `/health` and `/ready` for container probes, stopped with the worker.
async fn serve_health(
    redis: ConnectionManager,
    port: u16,
    shutdown: ShutdownCoordinator,
) -> Result<()> {
    let app = Router::new()
        .route("/ready", get(ready_handler))
        .with_state(redis)
        .merge(health_router(app_info!()));

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind health server to {}", addr))?;
    info!(port = %port, "Health server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
        .wrap_err("Health server failed")
}

/// Run the worker until SIGINT or SIGTERM.
///
/// # Errors
///
/// Fails when the Redis configuration is missing or invalid, when Redis
/// stays unreachable past the connection retries, or when the consumer
/// group cannot be created.
pub async fn run() -> Result<()> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let app_info = app_info!();
    info!(name = %app_info.name, version = %app_info.version, environment = ?environment, "Starting notification worker");

    let health_port = env_parse("NOTIFICATION_WORKER_HEALTH_PORT", DEFAULT_HEALTH_PORT)
        .wrap_err("Invalid health port")?;

    let redis_config = RedisConfig::from_env().wrap_err("Failed to load Redis configuration")?;
    info!("Connecting to Redis...");
    let redis = database::redis::connect_from_config_with_retry(redis_config, None)
        .await
        .wrap_err("Failed to connect to Redis")?;
    info!("Connected to Redis");

    let mut worker_config = WorkerConfig::from_stream_def::<NotificationStream>()
        .with_blocking(1000)
        .with_max_concurrent_jobs(10);
    if let Some(consumer_id) = stable_consumer_id() {
        worker_config = worker_config.with_consumer_id(consumer_id);
    }
    info!(
        stream = %worker_config.stream_name,
        consumer_group = %worker_config.consumer_group,
        consumer_id = %worker_config.consumer_id,
        block_timeout_ms = ?worker_config.block_timeout_ms,
        batch_size = %worker_config.batch_size,
        max_concurrent_jobs = %worker_config.max_concurrent_jobs,
        "Worker configuration loaded"
    );

    let shutdown = ShutdownCoordinator::new();
    let signal_listener = shutdown.clone();
    tokio::spawn(async move { signal_listener.wait_for_signal().await });

    let health_redis = redis.clone();
    let health_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = serve_health(health_redis, health_port, health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    let processor = NotificationProcessor::new(LogSink);
    let worker = StreamWorker::<NewItemNotification, _>::new(redis, processor, worker_config);
    let result = worker.run(shutdown.subscribe()).await;

    // Stops the health server when the worker exits on its own.
    shutdown.shutdown();
    result.map_err(|e| eyre::eyre!("{}", e))?;

    info!("Notification worker stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_id_follows_the_host() {
        temp_env::with_vars(
            [
                ("NOTIFICATION_WORKER_CONSUMER_ID", None),
                ("HOSTNAME", Some("worker-7d9f")),
            ],
            || {
                assert_eq!(
                    stable_consumer_id().as_deref(),
                    Some("notification-worker-worker-7d9f")
                );
                // Same host, same name on the next start.
                assert_eq!(stable_consumer_id(), stable_consumer_id());
            },
        );
    }

    #[test]
    fn explicit_consumer_id_wins_over_host() {
        temp_env::with_vars(
            [
                ("NOTIFICATION_WORKER_CONSUMER_ID", Some("notifier-a")),
                ("HOSTNAME", Some("worker-7d9f")),
            ],
            || assert_eq!(stable_consumer_id().as_deref(), Some("notifier-a")),
        );
    }

    #[test]
    fn no_host_keeps_the_random_name() {
        temp_env::with_vars(
            [
                ("NOTIFICATION_WORKER_CONSUMER_ID", None::<&str>),
                ("HOSTNAME", Some("  ")),
            ],
            || assert_eq!(stable_consumer_id(), None),
        );
    }
}

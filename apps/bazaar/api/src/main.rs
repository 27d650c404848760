use std::sync::Arc;
use std::time::Duration;

use axum_helpers::{JwtAuth, ShutdownCoordinator, create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{DatabaseConnection, run_migrations};
use database::redis::ConnectionManager;
use domain_marketplace::{
    CatalogService, CategoryService, ItemLifecycleService, MarketplaceState,
    PgCategoryRepository, PgItemRepository, PgUserDirectory,
};
use domain_notifications::{
    ChannelDispatcher, LogSink, NotificationDispatcher, NotificationProcessor,
    RedisStreamDispatcher, drain_channel,
};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    run_migrations::<migration::Migrator>(&db, config.app.name)
        .await
        .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;

    let redis = match config.redis.clone() {
        Some(redis_config) => Some(
            database::redis::connect_from_config_with_retry(redis_config, None)
                .await
                .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))?,
        ),
        None => None,
    };

    let shutdown = ShutdownCoordinator::new();
    let dispatcher = notification_dispatcher(redis.clone(), &shutdown);

    let state = AppState {
        jwt: JwtAuth::new(&config.jwt),
        marketplace: marketplace_state(&db, dispatcher),
        config,
        db,
        redis,
    };

    let router = axum_helpers::create_router::<openapi::ApiDoc>(api::routes(&state))?;
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!("Starting bazaar API (30s shutdown timeout)");

    let db = state.db.clone();
    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        &shutdown,
        async move {
            info!("Shutting down: closing database connections");
            match db.close().await {
                Ok(()) => info!("PostgreSQL connection closed"),
                Err(e) => tracing::error!(error = %e, "Error closing PostgreSQL"),
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Bazaar API shutdown complete");
    Ok(())
}

fn marketplace_state(
    db: &DatabaseConnection,
    dispatcher: Arc<dyn NotificationDispatcher>,
) -> MarketplaceState {
    let items = Arc::new(PgItemRepository::new(db.clone()));
    let categories = Arc::new(PgCategoryRepository::new(db.clone()));
    let users = Arc::new(PgUserDirectory::new(db.clone()));

    MarketplaceState {
        catalog: CatalogService::new(items.clone()),
        lifecycle: ItemLifecycleService::new(
            items.clone(),
            categories.clone(),
            users,
            dispatcher,
        ),
        categories: CategoryService::new(categories, items),
    }
}

/// Redis stream when configured, otherwise an in-process channel drained by
/// a background task that stops with the server.
fn notification_dispatcher(
    redis: Option<ConnectionManager>,
    shutdown: &ShutdownCoordinator,
) -> Arc<dyn NotificationDispatcher> {
    match redis {
        Some(redis) => {
            info!("Publishing notifications to the Redis stream");
            Arc::new(RedisStreamDispatcher::new(redis))
        }
        None => {
            info!("REDIS_URL not set, delivering notifications in-process");
            let (dispatcher, rx) = ChannelDispatcher::new();
            tokio::spawn(drain_channel(
                rx,
                NotificationProcessor::new(LogSink),
                shutdown.subscribe(),
            ));
            Arc::new(dispatcher)
        }
    }
}

//! Router assembly, health endpoints and graceful shutdown.
//!
//! ```ignore
//! let shutdown = ShutdownCoordinator::new();
//! let app = create_router::<ApiDoc>(api_routes)?.merge(health_router(app_info!()));
//! create_production_app(app, &config.server, Duration::from_secs(30), &shutdown, cleanup).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router, create_router_with_cors};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};

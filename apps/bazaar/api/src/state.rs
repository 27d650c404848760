//! Shared application state.

use axum_helpers::JwtAuth;
use database::postgres::DatabaseConnection;
use database::redis::ConnectionManager;
use domain_marketplace::MarketplaceState;

/// Cloned into every handler; all members are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub db: DatabaseConnection,
    /// Present when notifications go through the Redis stream.
    pub redis: Option<ConnectionManager>,
    pub jwt: JwtAuth,
    pub marketplace: MarketplaceState,
}

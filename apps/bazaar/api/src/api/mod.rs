use axum::{Router, middleware, routing::get};
use axum_helpers::optional_jwt_auth_middleware;

use crate::state::AppState;

pub mod health;

/// API routes without the `/api` prefix, which `create_router` adds.
///
/// Every route sees the JWT middleware; anonymous requests pass through and
/// the write handlers reject them.
pub fn routes(state: &AppState) -> Router {
    domain_marketplace::handlers::router(state.marketplace.clone()).layer(
        middleware::from_fn_with_state(state.jwt.clone(), optional_jwt_auth_middleware),
    )
}

/// `/ready`, probing the database and Redis when it is configured.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

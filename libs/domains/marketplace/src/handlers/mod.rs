//! HTTP surface of the marketplace.
//!
//! [`router`] expects the JWT middleware to run in front of it; write
//! handlers take a [`CurrentUser`] and answer 401 when the request is
//! anonymous. Every authenticated caller is registered as a recipient of
//! new-item announcements, whatever route it hits.

mod categories;
mod items;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use axum_helpers::{CurrentUser, JwtClaims};
use tracing::warn;

use crate::service::{CatalogService, CategoryService, ItemLifecycleService};

pub use categories::CategoriesApiDoc;
pub use items::ItemsApiDoc;

#[derive(Clone)]
pub struct MarketplaceState {
    pub catalog: CatalogService,
    pub lifecycle: ItemLifecycleService,
    pub categories: CategoryService,
}

/// `/items` and `/categories`, ready to be nested under `/api`.
pub fn router(state: MarketplaceState) -> Router {
    Router::new()
        .nest("/items", items::router())
        .nest("/categories", categories::router())
        .layer(middleware::from_fn_with_state(state.clone(), register_caller))
        .with_state(state)
}

async fn register_caller(
    State(state): State<MarketplaceState>,
    request: Request,
    next: Next,
) -> Response {
    let caller = request
        .extensions()
        .get::<JwtClaims>()
        .and_then(|claims| CurrentUser::try_from(claims).ok());

    if let Some(user) = caller {
        if let Err(e) = state.lifecycle.register(&user).await {
            warn!(user_id = %user.id, error = %e, "Could not register caller");
        }
    }

    next.run(request).await
}

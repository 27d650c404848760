use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    AuditEvent, AuditOutcome, CurrentUser, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
};
use utoipa::OpenApi;
use uuid::Uuid;

use super::MarketplaceState;
use crate::error::MarketplaceResult;
use crate::models::{Category, CreateCategory, UpdateCategory};

#[derive(OpenApi)]
#[openapi(
    paths(
        list_categories,
        create_category,
        get_category,
        update_category,
        delete_category,
    ),
    components(
        schemas(Category, CreateCategory, UpdateCategory),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Categories", description = "Item categories")
    )
)]
pub struct CategoriesApiDoc;

pub(super) fn router() -> Router<MarketplaceState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

fn audit(user: &CurrentUser, action: &str, id: Uuid, headers: &HeaderMap) {
    AuditEvent::new(
        Some(user.id),
        action,
        Some(format!("category:{id}")),
        AuditOutcome::Success,
    )
    .with_request(headers)
    .log();
}

/// List all categories
#[utoipa::path(
    get,
    path = "",
    tag = "Categories",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories(
    State(state): State<MarketplaceState>,
) -> MarketplaceResult<Json<Vec<Category>>> {
    Ok(Json(state.categories.list().await?))
}

/// Create a category
#[utoipa::path(
    post,
    path = "",
    tag = "Categories",
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_category(
    State(state): State<MarketplaceState>,
    user: CurrentUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> MarketplaceResult<impl IntoResponse> {
    let category = state.categories.create(input).await?;
    audit(&user, "category.create", category.id, &headers);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_category(
    State(state): State<MarketplaceState>,
    UuidPath(id): UuidPath,
) -> MarketplaceResult<Json<Category>> {
    Ok(Json(state.categories.get(id).await?))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Categories",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_category(
    State(state): State<MarketplaceState>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCategory>,
) -> MarketplaceResult<Json<Category>> {
    let category = state.categories.update(id, input).await?;
    audit(&user, "category.update", id, &headers);
    Ok(Json(category))
}

/// Delete a category together with its items
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category and its items deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_category(
    State(state): State<MarketplaceState>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> MarketplaceResult<StatusCode> {
    state.categories.delete(id).await?;
    audit(&user, "category.delete", id, &headers);
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    ApiQuery, AppError, AuditEvent, AuditOutcome, CurrentUser, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
};
use utoipa::OpenApi;
use uuid::Uuid;

use super::MarketplaceState;
use crate::error::MarketplaceResult;
use crate::models::{CreateItem, Item, ItemDetail, ItemQuery, UpdateItem};

#[derive(OpenApi)]
#[openapi(
    paths(
        list_items,
        create_item,
        list_my_items,
        get_item,
        update_item,
        delete_item,
        mark_as_sold,
    ),
    components(
        schemas(Item, ItemDetail, CreateItem, UpdateItem),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Items", description = "Classified ads")
    )
)]
pub struct ItemsApiDoc;

pub(super) fn router() -> Router<MarketplaceState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/mine", get(list_my_items))
        .route("/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/{id}/mark-as-sold", post(mark_as_sold))
}

fn audit(user: &CurrentUser, action: &str, id: Uuid, headers: &HeaderMap) {
    AuditEvent::new(
        Some(user.id),
        action,
        Some(format!("item:{id}")),
        AuditOutcome::Success,
    )
    .with_request(headers)
    .log();
}

/// List unsold items
#[utoipa::path(
    get,
    path = "",
    tag = "Items",
    params(ItemQuery),
    responses(
        (status = 200, description = "Unsold items matching the filters", body = Vec<Item>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_items(
    State(state): State<MarketplaceState>,
    ApiQuery(query): ApiQuery<ItemQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let category_id = query.category_id()?;
    let items = state.catalog.list(query.search(), category_id).await?;
    Ok(Json(items))
}

/// List a new item for sale
#[utoipa::path(
    post,
    path = "",
    tag = "Items",
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_item(
    State(state): State<MarketplaceState>,
    user: CurrentUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateItem>,
) -> MarketplaceResult<impl IntoResponse> {
    let item = state.lifecycle.create(&user, input).await?;
    audit(&user, "item.create", item.id, &headers);
    Ok((StatusCode::CREATED, Json(item)))
}

/// Items listed by the caller, sold or not
#[utoipa::path(
    get,
    path = "/mine",
    tag = "Items",
    responses(
        (status = 200, description = "The caller's items", body = Vec<Item>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_my_items(
    State(state): State<MarketplaceState>,
    user: CurrentUser,
) -> MarketplaceResult<Json<Vec<Item>>> {
    let items = state.lifecycle.list_mine(&user).await?;
    Ok(Json(items))
}

/// Item detail with up to three related items
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Items",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item found", body = ItemDetail),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_item(
    State(state): State<MarketplaceState>,
    UuidPath(id): UuidPath,
) -> MarketplaceResult<Json<ItemDetail>> {
    let detail = state.catalog.detail(id).await?;
    Ok(Json(detail))
}

/// Edit one of the caller's items
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Items",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_item(
    State(state): State<MarketplaceState>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    payload: Result<Json<UpdateItem>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    // Validation runs in the service, after the ownership check.
    let Json(input) = payload?;
    let item = state.lifecycle.edit(&user, id, input).await?;
    audit(&user, "item.update", id, &headers);
    Ok(Json(item))
}

/// Delete one of the caller's items
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Items",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_item(
    State(state): State<MarketplaceState>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> MarketplaceResult<impl IntoResponse> {
    state.lifecycle.delete(&user, id).await?;
    audit(&user, "item.delete", id, &headers);
    Ok(StatusCode::NO_CONTENT)
}

/// Flag an item as sold
#[utoipa::path(
    post,
    path = "/{id}/mark-as-sold",
    tag = "Items",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item is sold", body = Item),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn mark_as_sold(
    State(state): State<MarketplaceState>,
    user: CurrentUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> MarketplaceResult<Json<Item>> {
    let item = state.lifecycle.mark_as_sold(&user, id).await?;
    audit(&user, "item.mark_sold", id, &headers);
    Ok(Json(item))
}

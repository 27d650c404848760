use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Bazaar API",
        version = "0.1.0",
        description = "Classified-ad marketplace: browse listings, publish and manage your own items"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/items", api = domain_marketplace::ItemsApiDoc),
        (path = "/categories", api = domain_marketplace::CategoriesApiDoc)
    )
)]
pub struct ApiDoc;

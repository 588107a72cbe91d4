use axum::Json;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct NewListingDoc { pub item: String, pub price: String, pub seller: String }

#[derive(ToSchema)]
pub struct ListingDoc { pub item: String, pub price: String, pub seller: String }

#[derive(ToSchema)]
pub struct ListingIdDoc {
    /// `native` or `position`
    pub kind: String,
    /// Record id string, or zero-based snapshot position.
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

#[derive(ToSchema)]
pub struct ListingRefDoc { pub id: ListingIdDoc, pub listing: ListingDoc }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::listings::list,
        crate::routes::listings::create,
        crate::routes::listings::remove,
    ),
    components(schemas(HealthResponse, NewListingDoc, ListingDoc, ListingIdDoc, ListingRefDoc)),
    tags((name = "market", description = "Market listings"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use service::market::{Listing, ListingRef, MarketSnapshot};
use tracing::info;

use crate::{errors::JsonApiError, state::ServerState};

#[derive(Debug, Deserialize, Serialize)]
pub struct NewListing {
    pub item: String,
    pub price: String,
    pub seller: String,
}

#[utoipa::path(
    get, path = "/api/listings", tag = "market",
    responses((status = 200, description = "Current market snapshot"))
)]
pub async fn list(State(state): State<ServerState>) -> Json<MarketSnapshot> {
    Json(state.market.list_listings().await)
}

#[utoipa::path(
    post, path = "/api/listings", tag = "market",
    request_body = crate::openapi::NewListingDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 502, description = "Store Error")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Json(input): Json<NewListing>,
) -> Result<(StatusCode, Json<Listing>), JsonApiError> {
    let mutation = state.market.add_listing(&input.item, &input.price, &input.seller).await?;
    Ok((StatusCode::CREATED, Json(mutation.listing().clone())))
}

/// Delete by the handle returned from `GET /api/listings`.
#[utoipa::path(
    delete, path = "/api/listings", tag = "market",
    request_body = crate::openapi::ListingRefDoc,
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Listing no longer present"),
        (status = 502, description = "Store Error")
    )
)]
pub async fn remove(
    State(state): State<ServerState>,
    Json(target): Json<ListingRef>,
) -> Result<StatusCode, JsonApiError> {
    let mutation = state.market.delete_listing(&target).await?;
    info!(label = %mutation.listing().display_label(), "api delete");
    Ok(StatusCode::NO_CONTENT)
}

pub mod listings;
pub mod pages;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::{openapi, state::ServerState};

#[utoipa::path(
    get, path = "/health", tag = "market",
    responses((status = 200, description = "OK", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: market page, JSON API, health, static assets.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let static_dir = ServeDir::new(&state.ui.frontend_dir);

    let pages = Router::new()
        .route("/", get(pages::index))
        .route("/listings", post(pages::add))
        .route("/listings/delete", post(pages::delete));

    let api = Router::new()
        .route(
            "/api/listings",
            get(listings::list).post(listings::create).delete(listings::remove),
        )
        .route("/api-docs/openapi.json", get(openapi::openapi_json));

    Router::new()
        .route("/health", get(health))
        .nest_service("/static", static_dir)
        .merge(pages)
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

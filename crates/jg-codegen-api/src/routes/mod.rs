//! API route definitions and router builder.

pub mod catalog;
pub mod generate;
pub mod health;
pub mod sites;

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/generate_joi_code", post(generate::generate_joi_code))
        .route("/devices/classes", get(catalog::list_classes))
        .route("/sites", get(sites::list_sites))
        .route("/sites/{site_id}", get(sites::get_site));

    Router::new()
        .route("/health", get(health::health))
        .route("/generate_joi_code", post(generate::generate_joi_code))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

//! API layer - routes, handlers, and middleware

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, response::Json, routing::get, Router};
use serde_json::{json, Value as JsonValue};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_request_body_size;
    let cors_origins = state.config.server.cors_origins.clone();

    let api_router = routes::records::record_routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        crate::auth::auth_middleware,
    ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .with_state(state)
        // Applied in reverse order: the request id is assigned before tracing starts.
        .layer(middleware::trace())
        .layer(middleware::compression())
        .layer(middleware::cors(&cors_origins))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(DefaultBodyLimit::max(max_body_size))
}

async fn health_check() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "service": "medora",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

//! API layer - routes, handlers, and middleware

pub mod handlers;
pub mod middleware;
pub mod query;

use crate::state::AppState;
use axum::{
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.server.cors_origins.clone();

    let catalog_router = Router::new()
        .route("/products", get(handlers::catalog::get_products))
        .route("/filters", get(handlers::filters::get_filters))
        .route("/filter-counts", get(handlers::filters::get_filter_counts));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Root endpoint
        .route("/", get(root))
        // Catalog API routes
        .nest("/api/catalog", catalog_router)
        // Add state
        .with_state(state)
        // Add middleware (applied in reverse order)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(middleware::compression())
        .layer(middleware::cors(&cors_origins))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "catalog-server"
    }))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "server": "Vitryna Catalog",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

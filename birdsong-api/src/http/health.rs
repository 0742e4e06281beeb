//! Health check and relay statistics

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::http::AppState;

/// Health check router
pub fn create_health_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(relay_stats))
}

/// Basic health check (always returns OK if server is running)
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Live session count and lifetime delivery counters
pub async fn relay_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.relay.metrics())
}

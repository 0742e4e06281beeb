// Module: http
// Viewer page, its assets, and the push channel

pub mod error;
pub mod health;
pub mod websocket;

use axum::{routing::get, Router};
use birdsong_core::config::ServerConfig;
use birdsong_relay::BroadcastRelay;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub relay: BroadcastRelay,
    pub server: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(relay: BroadcastRelay, server: ServerConfig) -> Self {
        Self {
            relay,
            server: Arc::new(server),
        }
    }
}

/// Build the HTTP router
///
/// - `GET /`: the viewer page
/// - `/src/*`, `/audio/*`: visualization scripts and bird audio
/// - `GET /ws`: push channel for tweet events
/// - `GET /health`, `GET /stats`
pub fn create_router(state: AppState) -> Router {
    let server = state.server.clone();

    let router = Router::new()
        .route("/ws", get(websocket::websocket_handler))
        .merge(health::create_health_router())
        .route_service("/", ServeFile::new(&server.index_file))
        .nest_service("/src", ServeDir::new(&server.static_dir))
        .nest_service("/audio", ServeDir::new(&server.audio_dir));

    // Apply layers before state
    let router = router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    router.with_state(state)
}

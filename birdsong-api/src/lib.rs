//! HTTP surface: viewer WebSocket, static page assets, health and stats

pub mod http;

pub use http::{create_router, AppError, AppResult, AppState};

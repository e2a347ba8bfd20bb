//! Deepstake Server Library
//!
//! This module exposes the server components for integration testing.

pub mod config;
pub mod game;
pub mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Creates the application router with all endpoints
pub fn create_app(store: Arc<ws::RoomStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Deepstake Server" }))
        .route("/health", get(|| async { "OK" }))
        .route("/ws", get(ws::ws_handler).with_state(store))
        .layer(cors)
}

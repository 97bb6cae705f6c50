//! Web server module.
//!
//! - `POST /publish`: authenticate, validate and enqueue an email notification
//! - `GET /health`: liveness, touches no collaborator

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, outcome_response, publish, AppState, ErrorResponse, HealthResponse, MessageResponse,
};

/// Build the application router, rejecting bodies over `max_body_bytes`.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/publish", post(publish))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

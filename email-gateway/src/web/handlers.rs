//! HTTP endpoint handlers.
//!
//! The publish handler only shapes responses; the pipeline itself lives in
//! `Gateway`. Every outcome maps to exactly one status and body.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::gateway::{Gateway, Outcome};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Publish
// =============================================================================

/// Success body.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Failure body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

/// Publish endpoint.
///
/// The body is taken raw so a malformed envelope, or one over the body
/// limit, still gets a JSON error rather than the extractor's plain text.
pub async fn publish(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };

    info!(body_length = body.len(), "publish_request_received");

    let outcome = state.gateway.handle(&body).await;
    outcome_response(outcome)
}

/// Map a terminal pipeline state to its HTTP response.
///
/// A secret store outage answers like a bad token so unauthenticated callers
/// learn nothing about our infrastructure; the distinction is kept in logs.
pub fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Submitted => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Message published to SQS",
            }),
        )
            .into_response(),
        Outcome::BadRequest(_) => error(StatusCode::BAD_REQUEST, "Invalid request"),
        Outcome::Unauthorized | Outcome::SecretUnavailable(_) => {
            error(StatusCode::FORBIDDEN, "Invalid token")
        }
        Outcome::BadPayload(_) => error(StatusCode::BAD_REQUEST, "Invalid payload"),
        Outcome::DispatchFailed(_) => {
            error(StatusCode::SERVICE_UNAVAILABLE, "Failed to publish message")
        }
    }
}

fn rejection_response(rejection: BytesRejection) -> Response {
    let status = rejection.status();
    warn!(status = status.as_u16(), reason = %rejection.body_text(), "publish_body_rejected");

    if status == StatusCode::PAYLOAD_TOO_LARGE {
        error(status, "Payload too large")
    } else {
        error(StatusCode::BAD_REQUEST, "Invalid request")
    }
}

fn error(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

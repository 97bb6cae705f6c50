//! The per-request pipeline: parse, authenticate, validate, submit.
//!
//! ```text
//! Received → Authenticating → (Unauthorized | Validating)
//!          → (BadPayload | Submitting) → (Submitted | DispatchFailed)
//! ```
//!
//! Each request makes at most one secret store read and at most one
//! enqueue. Nothing is shared between requests beyond the client handles.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{Authenticator, SecretUnavailable};
use crate::dispatch::{Dispatcher, InvalidPayload, QueueUnavailable};

/// The request envelope could not be decoded.
#[derive(Debug, Error)]
pub enum BadRequest {
    #[error("request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request body is not a JSON object")]
    NotAnObject,
}

/// Decoded publish request.
///
/// A `token` that is absent or not a string is treated as no token.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub token: Option<String>,
    pub data: Option<Value>,
}

impl PublishRequest {
    pub fn parse(body: &[u8]) -> Result<Self, BadRequest> {
        let value: Value = serde_json::from_slice(body)?;

        let Value::Object(mut object) = value else {
            return Err(BadRequest::NotAnObject);
        };

        let token = match object.remove("token") {
            Some(Value::String(token)) => Some(token),
            _ => None,
        };

        Ok(Self {
            token,
            data: object.remove("data"),
        })
    }
}

/// Terminal state of one request.
#[derive(Debug)]
pub enum Outcome {
    Submitted,
    BadRequest(BadRequest),
    Unauthorized,
    SecretUnavailable(SecretUnavailable),
    BadPayload(InvalidPayload),
    DispatchFailed(QueueUnavailable),
}

/// Authenticator and dispatcher composed into one pipeline.
#[derive(Clone)]
pub struct Gateway {
    authenticator: Authenticator,
    dispatcher: Dispatcher,
}

impl Gateway {
    pub fn new(authenticator: Authenticator, dispatcher: Dispatcher) -> Self {
        Self {
            authenticator,
            dispatcher,
        }
    }

    /// Run a raw request body through the pipeline.
    pub async fn handle(&self, body: &[u8]) -> Outcome {
        let request = match PublishRequest::parse(body) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, body_length = body.len(), "publish_request_malformed");
                return Outcome::BadRequest(e);
            }
        };

        self.process(request).await
    }

    /// Run an already-decoded request through the pipeline.
    pub async fn process(&self, request: PublishRequest) -> Outcome {
        match self.authenticator.authenticate(request.token.as_deref()).await {
            Ok(true) => {}
            Ok(false) => return Outcome::Unauthorized,
            Err(e) => return Outcome::SecretUnavailable(e),
        }

        let payload = match self.dispatcher.validate_payload(request.data.as_ref()) {
            Ok(payload) => payload,
            Err(e) => return Outcome::BadPayload(e),
        };

        match self.dispatcher.submit(&payload).await {
            Ok(()) => {
                info!(queue = %self.dispatcher.queue_name(), "publish_request_submitted");
                Outcome::Submitted
            }
            Err(e) => Outcome::DispatchFailed(e),
        }
    }
}

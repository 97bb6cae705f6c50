//! Payload validation and hand-off to the queue.
//!
//! One enqueue attempt per request. The queue's own delivery semantics
//! govern what happens afterwards.

pub mod payload;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::queue::{MessageQueue, QueueError};

pub use payload::{EmailPayload, InvalidPayload, QueueMessage, REQUIRED_FIELDS, SCHEMA_VERSION};

/// The queue did not accept the message.
#[derive(Debug, Error)]
pub enum QueueUnavailable {
    #[error("failed to encode queue message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("queue {queue} unavailable: {source}")]
    Transport {
        queue: String,
        #[source]
        source: QueueError,
    },
}

/// Validates payloads and submits them to the configured queue.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<dyn MessageQueue>,
    queue_name: String,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn MessageQueue>, queue_name: impl Into<String>) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Check that `data` is an object carrying every required key.
    pub fn validate_payload(&self, data: Option<&Value>) -> Result<EmailPayload, InvalidPayload> {
        EmailPayload::validate(data).inspect_err(|e| warn!(error = %e, "payload_invalid"))
    }

    /// Enqueue the payload once. Failures are returned, never retried.
    pub async fn submit(&self, payload: &EmailPayload) -> Result<(), QueueUnavailable> {
        let body = QueueMessage::new(payload).to_body()?;

        if let Err(source) = self.queue.enqueue(&self.queue_name, &body).await {
            error!(queue = %self.queue_name, error = %source, "queue_publish_failed");
            return Err(QueueUnavailable::Transport {
                queue: self.queue_name.clone(),
                source,
            });
        }

        info!(queue = %self.queue_name, body_length = body.len(), "message_published");

        Ok(())
    }
}

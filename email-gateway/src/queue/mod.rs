//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - The `MessageQueue` seam the dispatcher publishes through
//! - An async lapin publisher implementing it
//!
//! ## Architecture
//!
//! ```text
//! Web Server → Dispatcher → MessageQueue → email queue → downstream consumer
//! ```

pub mod publisher;

use async_trait::async_trait;
use thiserror::Error;

pub use publisher::Publisher;

/// Errors raised by a queue backend while enqueueing a message.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to connect to broker: {0}")]
    Connect(#[source] lapin::Error),

    #[error("failed to declare queue {queue}: {source}")]
    Declare {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to publish to queue {queue}: {source}")]
    Publish {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("broker rejected message on queue {queue}")]
    Rejected { queue: String },
}

/// A durable, at-least-once ingestion sink.
///
/// Implementations must be cheap to share across requests; the dispatcher
/// holds one handle for the lifetime of the process.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueue one opaque message body on the named queue.
    async fn enqueue(&self, queue: &str, body: &[u8]) -> Result<(), QueueError>;
}

//! Async RabbitMQ publisher for enqueueing messages.
//!
//! This module provides a connection-managed publisher that can be shared
//! across multiple async tasks for high-throughput message publishing.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::{MessageQueue, QueueError};

/// Async RabbitMQ publisher with connection management.
///
/// The publisher maintains a persistent connection and confirm-mode channel
/// to RabbitMQ, automatically reconnecting on failure.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
    /// Queues declared on the current channel; cleared on reconnect.
    declared: Mutex<HashSet<String>>,
}

impl Publisher {
    /// Create a new publisher with the given RabbitMQ URL.
    ///
    /// No connection is opened until the first publish.
    pub fn new(url: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
                declared: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel, QueueError> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Double-check after acquiring write lock
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .map_err(QueueError::Connect)?;

        let ch = conn.create_channel().await.map_err(QueueError::Connect)?;

        ch.confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(QueueError::Connect)?;

        info!("rabbitmq_publisher_connected");

        self.inner.declared.lock().await.clear();
        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Declare the queue as durable unless already done on this channel.
    async fn ensure_declared(&self, channel: &Channel, queue: &str) -> Result<(), QueueError> {
        let mut declared = self.inner.declared.lock().await;
        if declared.contains(queue) {
            return Ok(());
        }

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|source| QueueError::Declare {
                queue: queue.to_string(),
                source,
            })?;

        info!(queue = queue, "rabbitmq_queue_declared");
        declared.insert(queue.to_string());

        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}

#[async_trait]
impl MessageQueue for Publisher {
    async fn enqueue(&self, queue: &str, body: &[u8]) -> Result<(), QueueError> {
        let channel = self.ensure_connected().await?;
        self.ensure_declared(&channel, queue).await?;

        let publish_error = |source: lapin::Error| QueueError::Publish {
            queue: queue.to_string(),
            source,
        };

        let confirmation = channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into()),
            )
            .await
            .map_err(publish_error)?
            .await
            .map_err(publish_error)?;

        if confirmation.is_nack() {
            warn!(queue = queue, "rabbitmq_publish_nacked");
            return Err(QueueError::Rejected {
                queue: queue.to_string(),
            });
        }

        info!(queue = queue, body_length = body.len(), "rabbitmq_published");

        Ok(())
    }
}

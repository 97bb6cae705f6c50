//! Email Gateway - token-authenticated email notification ingress.
//!
//! Callers post a shared-secret token and an email payload. The token is
//! checked against the secret store, the payload is checked for its required
//! fields, and the payload is handed to a durable queue for downstream
//! processing.
//!
//! ## Architecture
//!
//! ```text
//! POST /publish → Authenticator (secret store) → Dispatcher → queue
//! ```

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod queue;
pub mod web;

// Re-export commonly used types
pub use auth::{Authenticator, Credential, ParameterStoreClient, SecretStore, SecretUnavailable};
pub use config::{Config, ConfigError};
pub use dispatch::{Dispatcher, EmailPayload, InvalidPayload, QueueUnavailable};
pub use gateway::{Gateway, Outcome, PublishRequest};
pub use queue::{MessageQueue, Publisher, QueueError};
pub use web::AppState;

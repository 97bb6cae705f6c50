//! Email notification payload and the queue message contract.
//!
//! ## Queue message format (schema version 1)
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "payload": {
//!     "email_subject": "...",
//!     "email_sender": "...",
//!     "email_timestream": "...",
//!     "email_content": "...",
//!     "...": "any additional caller fields, forwarded unchanged"
//!   }
//! }
//! ```
//!
//! Bodies are UTF-8 JSON published with content type `application/json`.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Version stamped on every queue message body.
pub const SCHEMA_VERSION: u32 = 1;

/// Keys every payload must carry, in canonical order.
pub const REQUIRED_FIELDS: [&str; 4] = [
    "email_subject",
    "email_sender",
    "email_timestream",
    "email_content",
];

/// Payload failed field-presence validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPayload {
    #[error("payload is missing or not an object")]
    NotAnObject,

    #[error("payload is missing required fields: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// A validated email notification.
///
/// Values are opaque: only key presence is checked, so empty strings,
/// nulls and non-string values pass through as given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailPayload {
    pub email_subject: Value,
    pub email_sender: Value,
    pub email_timestream: Value,
    pub email_content: Value,
    /// Caller-supplied fields beyond the required four.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailPayload {
    /// Validate a raw `data` value.
    pub fn validate(data: Option<&Value>) -> Result<Self, InvalidPayload> {
        match data {
            Some(Value::Object(map)) => Self::from_map(map.clone()),
            _ => Err(InvalidPayload::NotAnObject),
        }
    }

    /// Build from a JSON object, naming every missing required key.
    pub fn from_map(mut map: Map<String, Value>) -> Result<Self, InvalidPayload> {
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !map.contains_key(*field))
            .collect();

        if !missing.is_empty() {
            return Err(InvalidPayload::Missing(missing));
        }

        let email_subject = map.remove("email_subject").unwrap_or_default();
        let email_sender = map.remove("email_sender").unwrap_or_default();
        let email_timestream = map.remove("email_timestream").unwrap_or_default();
        let email_content = map.remove("email_content").unwrap_or_default();

        Ok(Self {
            email_subject,
            email_sender,
            email_timestream,
            email_content,
            extra: map,
        })
    }
}

/// Versioned envelope written to the queue.
#[derive(Debug, Serialize)]
pub struct QueueMessage<'a> {
    pub schema_version: u32,
    pub payload: &'a EmailPayload,
}

impl<'a> QueueMessage<'a> {
    pub fn new(payload: &'a EmailPayload) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            payload,
        }
    }

    /// Encode as the UTF-8 JSON queue body.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

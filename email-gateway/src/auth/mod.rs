//! Shared-token authentication.
//!
//! The authoritative token lives in the secret store and is fetched on every
//! check, so a rotation takes effect on the very next request.

pub mod secret_store;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

pub use secret_store::{ParameterStoreClient, SecretStore, SecretStoreError};

/// The authoritative shared-secret token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Byte-exact comparison in constant time with respect to contents.
    pub fn matches(&self, presented: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), presented.as_bytes())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The secret store could not produce the authoritative token.
#[derive(Debug, Error)]
#[error("credential {parameter} unavailable: {source}")]
pub struct SecretUnavailable {
    pub parameter: String,
    #[source]
    pub source: SecretStoreError,
}

/// Decides whether a caller-supplied token matches the authoritative one.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn SecretStore>,
    parameter: String,
}

impl Authenticator {
    pub fn new(store: Arc<dyn SecretStore>, parameter: impl Into<String>) -> Self {
        Self {
            store,
            parameter: parameter.into(),
        }
    }

    /// Fetch the current token from the secret store, decrypted.
    pub async fn fetch_current_credential(&self) -> Result<Credential, SecretUnavailable> {
        match self.store.get_parameter(&self.parameter, true).await {
            Ok(value) => Ok(Credential::new(value)),
            Err(source) => {
                error!(parameter = %self.parameter, error = %source, "secret_store_unavailable");
                Err(SecretUnavailable {
                    parameter: self.parameter.clone(),
                    source,
                })
            }
        }
    }

    /// Check a presented token against the authoritative one.
    ///
    /// Returns `Ok(false)` for an absent or mismatched token. A secret store
    /// failure is an error, never a silent `false`.
    pub async fn authenticate(&self, presented: Option<&str>) -> Result<bool, SecretUnavailable> {
        let current = self.fetch_current_credential().await?;

        let valid = match presented {
            Some(token) => current.matches(token),
            None => false,
        };

        if !valid {
            warn!(has_token = presented.is_some(), "token_invalid");
        }

        Ok(valid)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

//! Secret store access.
//!
//! The production client is SSM Parameter Store through `aws-sdk-ssm`, with
//! credentials and region resolved from the ambient AWS chain (env, profile,
//! container or instance metadata). Setting an endpoint override points it at
//! LocalStack instead.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::retry::RetryConfig;
use aws_sdk_ssm::config::timeout::TimeoutConfig;
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Errors raised by a secret store lookup.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("parameter {0} not found")]
    NotFound(String),

    #[error("secret store unreachable: {0}")]
    Unreachable(String),

    #[error("secret store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed secret store response: {0}")]
    Malformed(String),
}

/// Key-value parameter lookup.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a single parameter value, decrypted when `with_decryption` is set.
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<String, SecretStoreError>;
}

/// SSM Parameter Store client.
///
/// Cheap to clone; the SDK client pools connections. Requests are made once,
/// SDK retries are disabled.
#[derive(Clone, Debug)]
pub struct ParameterStoreClient {
    client: aws_sdk_ssm::Client,
}

impl ParameterStoreClient {
    /// Load region and credentials from the environment.
    ///
    /// `endpoint` overrides the regional SSM endpoint; `timeout` bounds each
    /// lookup end to end.
    pub async fn from_env(endpoint: Option<&Url>, timeout: Duration) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::disabled())
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());

        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint.as_str());
        }

        let sdk_config = loader.load().await;
        Self::with_config(aws_sdk_ssm::Config::from(&sdk_config))
    }

    /// Build from an explicit SDK configuration.
    pub fn with_config(config: aws_sdk_ssm::Config) -> Self {
        Self {
            client: aws_sdk_ssm::Client::from_conf(config),
        }
    }
}

#[async_trait]
impl SecretStore for ParameterStoreClient {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<String, SecretStoreError> {
        let result = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let Some(service_error) = err.as_service_error() else {
                    return Err(SecretStoreError::Unreachable(
                        DisplayErrorContext(&err).to_string(),
                    ));
                };

                if service_error.is_parameter_not_found() {
                    warn!(parameter = %name, "secret_parameter_not_found");
                    return Err(SecretStoreError::NotFound(name.to_string()));
                }

                let status = err
                    .raw_response()
                    .map(|response| response.status().as_u16())
                    .unwrap_or_default();
                let code = service_error.code().unwrap_or("Unknown");

                warn!(parameter = %name, status, error_code = %code, "secret_store_rejected");

                return Err(SecretStoreError::Rejected {
                    status,
                    message: service_error.message().unwrap_or(code).to_string(),
                });
            }
        };

        let value = output
            .parameter()
            .and_then(|parameter| parameter.value())
            .ok_or_else(|| SecretStoreError::Malformed("response has no parameter value".into()))?;

        info!(parameter = %name, "secret_parameter_fetched");
        Ok(value.to_string())
    }
}

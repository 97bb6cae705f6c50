//! Email Gateway web server.
//!
//! Loads configuration, builds the secret store and queue clients once, and
//! serves `POST /publish` until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use email_gateway::web::{router, AppState};
use email_gateway::{Authenticator, Config, Dispatcher, Gateway, ParameterStoreClient, Publisher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("gateway_starting");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        queue = %config.queue_name,
        token_parameter = %config.token_parameter,
        secret_store_url = ?config.secret_store_url.as_ref().map(|u| u.as_str()),
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    let secret_store = ParameterStoreClient::from_env(
        config.secret_store_url.as_ref(),
        Duration::from_millis(config.request_timeout_ms),
    )
    .await;
    info!("secret_store_client_created");

    let publisher = Publisher::new(config.cloudamqp_url.clone());
    info!("rabbitmq_publisher_created");

    let gateway = Gateway::new(
        Authenticator::new(Arc::new(secret_store), config.token_parameter.clone()),
        Dispatcher::new(Arc::new(publisher.clone()), config.queue_name.clone()),
    );

    let app = router(AppState::new(gateway), config.max_body_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "gateway_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    publisher.close().await;

    info!("gateway_shutdown_complete");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
///
/// A signal source that cannot be installed is logged and never fires; the
/// other one still triggers shutdown.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "sigint_handler_install_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "sigterm_handler_install_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = received, "gateway_shutting_down");
}

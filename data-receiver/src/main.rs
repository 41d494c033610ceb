//! Data Receiver web server.
//!
//! This binary:
//! - Loads the service document (file or inline JSON)
//! - Builds one extractor/authenticator/writer binding per service
//! - Serves `GET /health` and `POST /data/:service`
//! - On SIGINT/SIGTERM drains in-flight requests, then closes every writer

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use receiver::{router, AppState, Config, ConfigSource, ServiceRegistry};

/// Command line arguments; each also reads its environment variable.
#[derive(Debug, Parser)]
#[command(name = "data-receiver", version, about)]
struct Args {
    /// Service configuration file (.json, .yaml or .yml)
    #[arg(long = "config", env = "DATA_RECEIVER_CONFIG")]
    config: Option<PathBuf>,

    /// Inline JSON service configuration
    #[arg(long = "inline-config", env = "DATA_RECEIVER_INLINE_CONFIG")]
    inline_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let args = Args::parse();
    let mut config = Config::from_env();
    if args.config.is_some() {
        config.config_path = args.config;
    }
    if args.inline_config.is_some() {
        config.inline_config = args.inline_config;
    }

    info!(
        port = config.port,
        config_path = ?config.config_path,
        inline_config = config.inline_config.is_some(),
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    let source = ConfigSource::detect(config.config_path.as_deref(), config.inline_config.as_deref())
        .context("No service configuration")?;
    let services = source
        .load()
        .context("Failed to load service configuration")?;

    let registry = ServiceRegistry::from_config(&services).await;

    let state = AppState::new(config.clone(), registry.clone());
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("writers_closing");
    if tokio::time::timeout(config.writer_close_timeout, registry.close_all())
        .await
        .is_err()
    {
        warn!(
            timeout_ms = config.writer_close_timeout.as_millis() as u64,
            "writers_close_timed_out"
        );
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}

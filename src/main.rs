//! EVM Gateway - client-side transaction execution service
//!
//! Prices fees, shapes transactions for software or hardware signers,
//! submits them once, and confirms them under a bounded timeout against
//! EVM-compatible networks.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod api;
mod chain;
mod config;
mod error;
mod metrics;
mod ops;
mod tokens;
mod tx;
mod wallet;

use chain::NetworkManager;
use config::Settings;
use metrics::MetricsServer;
use wallet::SignerResolver;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting EVM Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Loaded configuration for {} networks",
        settings.networks.len()
    );

    // Initialize per-network clients, estimators, and token registries
    let networks = Arc::new(NetworkManager::new(&settings)?);
    info!("Network connections initialized");

    // Hardware device transports are wired by an external integration;
    // none ships in-process, so hardware-registered addresses resolve
    // only once a transport is provided here.
    let signers = Arc::new(SignerResolver::from_config(&settings.wallet, None)?);

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    // Start API server
    let api_handle = tokio::spawn({
        let server = settings.server.clone();
        let networks = networks.clone();
        let signers = signers.clone();
        async move {
            if let Err(e) = api::run_server(server, networks, signers).await {
                error!("API server error: {}", e);
            }
        }
    });

    info!("EVM Gateway is running");
    info!(
        "API server: http://{}:{}",
        settings.server.host, settings.server.port
    );
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    api_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("EVM Gateway stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,evm_gateway=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

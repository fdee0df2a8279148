#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use log::{LevelFilter, info, warn};
use tokio::net::TcpListener;

use fabric_validator::app_config::ServerConfig;
use fabric_validator::logging::ConsoleLogger;
use fabric_validator::server::{AppState, build_router};

#[tokio::main]
async fn main() -> Result<()> {
    ConsoleLogger::init(LevelFilter::Info)?;

    let config = ServerConfig::from_env().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let state = AppState::from_config(config.clone());
    if !state.service.tool_available() {
        warn!(
            "{} not found; /health will report unhealthy until it is installed",
            config.tool
        );
    }

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!(
        "Starting validator server on port {} (mode={}, tool={}, timeout={}s)",
        config.port, config.mode, config.tool, config.timeout_secs
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    info!("Validator server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

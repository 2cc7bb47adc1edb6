//! # MediSync Server
//!
//! Binary entry point: configuration, database, default data, HTTP.
//!
//! ## Startup
//! ```text
//! ServerConfig::load() ─► Database::new() ─► migrations ─► ensure_defaults()
//!                                                              │
//!                      axum::serve(listener, router) ◄─────────┘
//!                              │
//!                     Ctrl+C / SIGTERM ─► drain ─► close pool
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use medisync_db::{seed, Database, DbConfig};
use medisync_server::{build_router, config::ServerConfig, AppState};

const DEFAULT_LOG_FILTER: &str = "info,medisync=debug,sqlx=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting MediSync server...");

    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        address = %config.bind_address(),
        database = %config.database_path.display(),
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(config.database_path.clone()).max_connections(config.max_connections),
    )
    .await
    .context("Failed to open database")?;

    if seed::ensure_defaults(&db).await? {
        info!("Default data created");
    }

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!(address = %config.bind_address(), "Listening");

    let state = Arc::new(AppState::new(db.clone(), config));
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

//! Storefront live-viewer server.
//!
//! Main entry point that wires the crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use liveview_api::{AppState, build_app};
use liveview_cache::PresenceManager;
use liveview_core::config::AppConfig;
use liveview_core::error::AppError;
use liveview_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("LIVEVIEW_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting live-viewer server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Presence store ───────────────────────────────────
    tracing::info!(provider = %config.presence.provider, "Initializing presence store");
    let presence = PresenceManager::new(&config.presence).await?;
    tracing::info!(backend = presence.active_backend(), "Presence store ready");

    // ── Step 2: Realtime engine ──────────────────────────────────
    let engine = Arc::new(RealtimeEngine::new(&config, presence).await?);

    // ── Step 3: HTTP server ──────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let app = build_app(AppState::new(Arc::new(config), Arc::clone(&engine)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Live-viewer server listening on {addr}");

    // ── Step 4: Serve until signalled ────────────────────────────
    let stop = CancellationToken::new();
    let graceful = stop.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { graceful.cancelled().await })
            .await
    });

    tokio::select! {
        result = &mut server => return server_result(result),
        _ = shutdown_signal() => {}
    }

    // ── Step 5: Graceful shutdown ────────────────────────────────
    tracing::info!("Shutdown signal received, closing live connections...");
    // stop accepting first; upgrades already in flight are closed on join
    stop.cancel();
    engine.shutdown().await;

    match tokio::time::timeout(grace, server).await {
        Ok(result) => server_result(result)?,
        Err(_) => tracing::warn!(
            grace_seconds = grace.as_secs(),
            "HTTP connections still open after grace period"
        ),
    }

    tracing::info!("Live-viewer server shut down gracefully");
    Ok(())
}

/// Flatten the server task's outcome into an `AppError`.
fn server_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(AppError::internal(format!("Server error: {e}"))),
        Err(e) => Err(AppError::internal(format!("Server task failed: {e}"))),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}

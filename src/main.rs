//! BloodLink Server: donor matching and alert dispatch.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use bloodlink_core::config::AppConfig;
use bloodlink_core::error::AppError;
use bloodlink_core::traits::gateway::NotificationGateway;
use bloodlink_engine::LoggingGateway;
use bloodlink_store::StoreManager;
use bloodlink_worker::RetryRunner;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("BLOODLINK_ENV").unwrap_or_else(|_| "development".to_string());
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
    tracing::info!("Starting BloodLink v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Record store ─────────────────────────────────────
    tracing::info!(
        "Initializing record store (provider: {})...",
        config.store.provider
    );
    let store = StoreManager::new(&config.store)?.provider();

    // ── Step 2: Notification gateway ─────────────────────────────
    let gateway: Arc<dyn NotificationGateway> = Arc::new(LoggingGateway::new());

    // ── Step 3: Services ─────────────────────────────────────────
    let config = Arc::new(config);
    let app_state = bloodlink_api::AppState::new(Arc::clone(&config), store, gateway);
    let dispatcher = Arc::clone(&app_state.dispatcher);

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Retry and expiry worker ──────────────────────────
    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting retry worker...");
        let runner = RetryRunner::new(
            Arc::clone(&dispatcher),
            (*app_state.alert_service).clone(),
            config.worker.clone(),
        );
        let worker_cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            runner.run(worker_cancel).await;
        }))
    } else {
        tracing::info!("Retry worker disabled");
        None
    };

    // ── Step 6: HTTP server ──────────────────────────────────────
    let app = bloodlink_api::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("BloodLink server listening on {}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 7: Drain in-flight sends ────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    if !dispatcher.drain_timeout(grace).await {
        tracing::warn!(
            "Abandoning {} in-flight sends after the grace period",
            dispatcher.in_flight()
        );
    }

    tracing::info!("BloodLink server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

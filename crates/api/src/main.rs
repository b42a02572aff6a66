use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use notify_gate_api::app::{self, AppState, Backend};
use notify_gate_api::config::{Config, StorageBackend};
use notify_gate_api::jobs::{JobScheduler, PoolMetricsJob, StalePendingSweepJob};
use notify_gate_api::middleware::{init_metrics, logging::init_logging};
use notify_gate_api::services::build_sender;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging).context("failed to initialize logging")?;
    init_metrics().context("failed to install Prometheus recorder")?;

    info!("Starting Notify Gate API v{}", env!("CARGO_PKG_VERSION"));

    let backend = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

            info!("Running database migrations...");
            persistence::db::run_migrations(&pool).await?;
            info!("Migrations completed");

            Backend::postgres(pool)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; state is lost on restart");
            Backend::in_memory()
        }
    };

    let sender = build_sender(&config.delivery).context("failed to build channel sender")?;
    info!(provider = ?config.delivery.provider, "Channel sender ready");

    let addr = config.socket_addr()?;
    let state = AppState::new(config.clone(), backend.clone(), sender);

    let mut scheduler = JobScheduler::new();
    scheduler.register(StalePendingSweepJob::new(
        state.engine.clone(),
        config.delivery.stale_pending_age(),
        Duration::from_secs(config.delivery.sweep_interval_secs),
    ));
    if let Some(pool) = backend.pool.clone() {
        scheduler.register(PoolMetricsJob::new(pool));
    }
    scheduler.start();

    let app = app::create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

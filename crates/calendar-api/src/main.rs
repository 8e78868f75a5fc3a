//! Calendar API server entry point.

use std::sync::Arc;

use calendar_api::config::{Config, StorageKind};
use calendar_api::error::AppError;
use calendar_api::state::AppState;
use calendar_api::{build_router, telemetry};
use calendar_core::id::UuidIdGenerator;
use calendar_core::storage::EventStorage;
use calendar_store::{MemoryEventStore, PgEventStore};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!(storage = %config.storage, "Starting calendar API server");

    let event_storage = open_storage(&config).await?;
    let shutdown = CancellationToken::new();
    let app_state = AppState::new(
        event_storage,
        Arc::new(UuidIdGenerator),
        config.storage,
        shutdown.clone(),
    );
    let app = build_router(app_state);

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal(shutdown))
        .await?;

    tracing::info!("Server stopped");
    telemetry.shutdown();
    Ok(())
}

async fn open_storage(config: &Config) -> Result<Arc<dyn EventStorage>, AppError> {
    match config.storage {
        StorageKind::Memory => Ok(Arc::new(MemoryEventStore::new())),
        StorageKind::Sql => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".into())
            })?;
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await?;
            let store = PgEventStore::new(pool);
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM and cancels in-flight storage work.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

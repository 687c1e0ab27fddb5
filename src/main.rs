use campus_store::{Config, LedgerService, Storage, api, logger};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    logger::init_logger(&config.log_level, config.log_json)?;

    tracing::info!(database = %config.database_path, "campus store starting");
    let storage = Storage::open(&config.database_path)?;
    let (service, report) = LedgerService::load(storage, config.flush_every)?;
    if !report.is_clean() {
        tracing::warn!(
            restored = report.restored,
            corrected = report.corrected,
            dropped = report.dropped,
            rejected = report.rejected,
            "stored product tables diverged"
        );
    }
    let service = Arc::new(service);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, api::router(service.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Requests have drained; flush under the write lock
    service.shutdown()?;
    tracing::info!("bye");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}

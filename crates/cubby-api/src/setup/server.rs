//! Server startup and graceful shutdown.

use anyhow::Result;
use axum::Router;
use cubby_core::Config;

/// Bind the listener and serve until a shutdown signal arrives.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        environment = %config.environment(),
        default_backend = %config.storage_backend(),
        max_file_size_mb = config.max_file_size_bytes() / 1024 / 1024,
        "Accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

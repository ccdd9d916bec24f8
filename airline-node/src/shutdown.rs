//! Graceful shutdown: stop accepting connections on SIGINT/SIGTERM, then let
//! the caller snapshot state before the process exits.

use tokio::signal;

/// Resolves on SIGINT or, on unix, SIGTERM. Intended as the future passed to
/// axum's `with_graceful_shutdown`.
pub async fn signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

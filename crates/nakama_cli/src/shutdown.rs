//! Shutdown signal handling
//!
//! Resolves a oneshot receiver on SIGINT or SIGTERM (Ctrl+C on Windows).

use tokio::sync::oneshot;
use tracing::{info, warn};

/// Set up a shutdown signal handler
///
/// # Returns
/// * `oneshot::Receiver<()>` - Receiver that completes when shutdown is requested
pub fn setup_shutdown_handler() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = tx.send(());
    });

    rx
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm) = match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Unix signal handlers unavailable ({}), falling back to Ctrl+C", e);
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received - shutting down"),
        _ = sigterm.recv() => info!("SIGTERM received - shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received - shutting down"),
        // Without any signal source the tool runs until its work is done.
        Err(e) => {
            warn!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

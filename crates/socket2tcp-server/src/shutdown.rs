//! Shutdown coordination.
//!
//! The coordinator owns the token the listening endpoint is bound with.
//! Triggering it (from an OS signal or programmatically) closes the
//! endpoint, which makes the accept loop stop. Active connections are not
//! touched.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Closes the listening endpoint on request, exactly once.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to hand to the server at bind time.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Close the endpoint. Later calls are no-ops.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Spawn a task that triggers shutdown on the first SIGINT/SIGTERM.
    ///
    /// The task ends early, without logging, if shutdown is triggered by
    /// other means.
    pub fn spawn_signal_watcher(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = shutdown_signal() => {
                    info!("received termination signal, gracefully shutting down");
                    token.cancel();
                }
            }
        })
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            // Fall back to waiting forever
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Fans a single shutdown signal out to the HTTP server and background tasks.
///
/// Subscribers get a `watch::Receiver<bool>` that flips to `true` once.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn shutdown(&self) {
        let changed = self.tx.send_if_modified(|stopping| {
            let was_running = !*stopping;
            *stopping = true;
            was_running
        });
        if changed {
            info!("Initiating graceful shutdown");
        }
    }

    /// Resolves once shutdown has been requested, by signal or by [`shutdown`](Self::shutdown).
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        // Err means the sender is gone, which only happens after shutdown.
        let _ = rx.wait_for(|stopping| *stopping).await;
    }

    /// Waits for SIGINT/SIGTERM, then broadcasts shutdown.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = shutdown_signal() => self.shutdown(),
            _ = self.wait() => {}
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Completes on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn subscribers_see_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        let mut rx = coordinator.subscribe();
        assert!(!*rx.borrow());

        coordinator.shutdown();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(coordinator.is_shutting_down());
    }

    #[tokio::test]
    async fn wait_returns_after_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();
        let handle = tokio::spawn(async move { waiter.wait().await });

        coordinator.shutdown();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("wait should complete")
            .unwrap();
    }

    #[test]
    fn shutdown_twice_is_harmless() {
        let coordinator = ShutdownCoordinator::default();
        coordinator.shutdown();
        coordinator.shutdown();
        assert!(coordinator.is_shutting_down());
    }
}

// Signal handling module
//
// Supported signals:
// - SIGHUP:  Reload deployments (serve) or rescan public assets (dev)
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

/// Signal handler state
pub struct SignalHandler {
    /// Shutdown signal (SIGTERM, SIGINT)
    pub shutdown: Arc<Notify>,
    /// Reload signal (SIGHUP, file watcher)
    pub reload: Arc<Notify>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(Notify::new()),
            reload: Arc::new(Notify::new()),
        }
    }

    /// Request a graceful shutdown
    ///
    /// `notify_one` stores a permit, so a shutdown requested before the
    /// server loop starts waiting is not lost.
    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Start signal handlers (Unix)
///
/// | Signal  | Action            |
/// |---------|-------------------|
/// | SIGHUP  | Reload            |
/// | SIGTERM | Graceful stop     |
/// | SIGINT  | Graceful stop     |
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tracing::debug!(pid = std::process::id(), "Signal handlers registered");

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("SIGHUP received, reloading");
                    handler.reload.notify_one();
                }
                _ = sigterm.recv() => {
                    tracing::info!("SIGTERM received, initiating graceful shutdown");
                    handler.request_shutdown();
                    break;
                }
                _ = sigint.recv() => {
                    tracing::info!("SIGINT received, initiating graceful shutdown");
                    handler.request_shutdown();
                    break;
                }
            }
        }
    });

    Ok(())
}

/// Fallback for non-Unix platforms: only Ctrl+C is handled
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            tracing::info!("Ctrl+C received, initiating graceful shutdown");
            handler.request_shutdown();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_before_wait_is_kept() {
        let handler = SignalHandler::new();
        handler.request_shutdown();
        // permit stored by notify_one resolves immediately
        tokio::time::timeout(std::time::Duration::from_secs(1), handler.shutdown.notified())
            .await
            .unwrap();
    }
}

//! Server module
//!
//! Listener setup, the accept loop, per-connection handling and signals.

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use listener::create_reusable_listener;
pub use signal::{start_signal_handler, SignalHandler};

/// How long in-flight connections get to finish after shutdown is requested
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept connections until shutdown is requested, then drain
pub async fn run(listener: TcpListener, state: Arc<AppState>, signals: Arc<SignalHandler>) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = signals.shutdown.notified() => break,
        }
    }

    drop(listener);
    logger::log_shutdown(active_connections.load(Ordering::SeqCst));
    drain(&active_connections).await;
}

/// Wait for active connections to reach zero, up to `DRAIN_TIMEOUT`
async fn drain(active_connections: &AtomicUsize) {
    let waited = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while active_connections.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(DRAIN_POLL).await;
        }
    })
    .await;

    if waited.is_err() {
        logger::log_warning(&format!(
            "Shutdown with {} connection(s) still open",
            active_connections.load(Ordering::SeqCst)
        ));
    }
}

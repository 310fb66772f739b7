//! Logger module
//!
//! Thin layer over `tracing`:
//! - subscriber setup (level from config, `-v`/`-q`, `RUST_LOG`)
//! - server lifecycle logging
//! - access logging under the `access` target
//! - error and warning helpers used where no span context is needed

mod format;

pub use format::AccessLogEntry;

use std::net::SocketAddr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};

/// Initialize the global subscriber
///
/// Should be called once at application startup. A second call (as in
/// tests) is ignored.
pub fn init(logging: &LoggingConfig, verbose: u8, quiet: bool) {
    let level = effective_level(&logging.level, verbose, quiet);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},hyper=warn", level.as_str().to_lowercase()))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    if result.is_ok() {
        tracing::debug!(level = %level, json = logging.json, "Logging initialized");
    }
}

/// Resolve the level from config and CLI flags
fn effective_level(configured: &str, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => configured.parse().unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, functions: &[String]) {
    tracing::info!("======================================");
    tracing::info!("Listening on: http://{addr}");
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    tracing::info!(
        "Asset cache: max-age={}, gzip: {}",
        config.assets.cache_max_age,
        config.assets.gzip
    );
    for name in functions {
        tracing::info!("Function: {name}");
    }
    if let Some(ref default) = config.server.default_function {
        tracing::info!("Default function: {default}");
    }
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

pub fn log_assets_loaded(function: &str, count: usize, bytes: usize) {
    tracing::info!(function, count, bytes, "Assets loaded");
}

pub fn log_shutdown(active: usize) {
    tracing::info!("Shutdown requested, {active} connection(s) still active");
}

// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub assets: AssetsConfig,
    pub store: StoreConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Function served when the Host header names no deployed function
    #[serde(default)]
    pub default_function: Option<String>,
    /// Largest request body forwarded to a function, in bytes
    pub max_body_size: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Emit all log events as JSON lines
    #[serde(default)]
    pub json: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: default_access_log_format(),
            json: false,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Static asset configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AssetsConfig {
    /// `max-age` in seconds sent with every asset (7 days by default)
    pub cache_max_age: u32,
    pub gzip: bool,
    /// flate2 compression level, 0-9
    pub gzip_level: u32,
    /// Assets smaller than this are never compressed
    pub gzip_min_size: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            cache_max_age: super::DEFAULT_CACHE_MAX_AGE,
            gzip: true,
            gzip_level: 6,
            gzip_min_size: 0,
        }
    }
}

/// Deployment store configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    pub dir: PathBuf,
    /// Number of deployments retained per function
    pub keep: usize,
}

// Configuration module entry point
// Layers built-in defaults, an optional TOML file and EDGEHOST_* variables

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::{Error, Result};

pub use state::{host_label, AppState, Routing, Site};
pub use types::{AssetsConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig, StoreConfig};

/// Seven days, the lifetime advertised for every static asset
pub const DEFAULT_CACHE_MAX_AGE: u32 = 604_800;

/// Config file looked up when `--config` is not given (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "edgehost";

impl Config {
    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.max_body_size", 10_485_760)? // 10MB
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("logging.json", false)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("assets.cache_max_age", i64::from(DEFAULT_CACHE_MAX_AGE))?
            .set_default("assets.gzip", true)?
            .set_default("assets.gzip_level", 6)?
            .set_default("assets.gzip_min_size", 0)?
            .set_default("store.dir", ".edgehost-store")?
            .set_default("store.keep", 5)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("EDGEHOST")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| Error::InvalidAddress(addr))
    }
}

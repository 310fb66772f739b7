//! Command implementations
//!
//! `deploy` and `ls` are synchronous filesystem work; `dev` and `serve`
//! run the HTTP server and must be called inside a Tokio runtime.

pub mod deploy;
pub mod dev;
pub mod list;
pub mod serve;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::function::env;

/// Variables from `--env`, empty when the flag is absent
fn load_env(path: Option<&Path>) -> Result<BTreeMap<String, String>> {
    match path {
        Some(path) => {
            let vars = env::parse_env_file(path)?;
            tracing::debug!(file = %path.display(), count = vars.len(), "Environment loaded");
            Ok(vars)
        }
        None => Ok(BTreeMap::new()),
    }
}

/// Byte count with a binary unit, one decimal past bytes
#[allow(clippy::cast_precision_loss)]
fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

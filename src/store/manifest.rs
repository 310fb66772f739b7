// Deployment manifest
// Written before `current` is switched, read on every load

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub function: String,
    pub deployment_id: String,
    pub created_at: DateTime<Utc>,
    /// Entry file, relative to the deployment directory
    pub index: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Relative path, `/`-separated; also the URL path without the leading slash
    pub path: String,
    pub size: u64,
    /// Size of the precompressed body, if one was stored
    #[serde(default)]
    pub gzip_size: Option<u64>,
    pub etag: String,
}

impl Manifest {
    pub fn total_size(&self) -> u64 {
        self.assets.iter().map(|a| a.size).sum()
    }

    pub fn gzip_count(&self) -> usize {
        self.assets.iter().filter(|a| a.gzip_size.is_some()).count()
    }
}

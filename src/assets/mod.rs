//! Static asset module
//!
//! Discovers the files of a function's public directory, keeps them in
//! memory together with their gzip variants, and maps request paths to
//! them.
//!
//! Request path matching, first hit wins:
//! 1. the relative path itself (`/images/image.png` -> `images/image.png`)
//! 2. `<path>.html` (`/about` -> `about.html`)
//! 3. `<path>/index.html` (`/docs` -> `docs/index.html`, `/` -> `index.html`)

pub mod gzip;

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use hyper::body::Bytes;
use percent_encoding::percent_decode_str;
use walkdir::WalkDir;

use crate::config::AssetsConfig;
use crate::error::{Error, IoResultExt, Result};
use crate::http::{cache, mime};
use crate::logger;

/// One static file ready to be served
#[derive(Debug, Clone)]
pub struct Asset {
    /// Relative path, `/`-separated, no leading slash
    pub path: String,
    pub content: Bytes,
    pub gzip: Option<Bytes>,
    pub content_type: &'static str,
    pub etag: String,
}

impl Asset {
    pub fn new(path: String, content: Bytes, gzip: Option<Bytes>) -> Self {
        let content_type = mime::get_content_type(Path::new(&path).extension().and_then(|e| e.to_str()));
        let etag = cache::generate_etag(&content);
        Self {
            path,
            content,
            gzip,
            content_type,
            etag,
        }
    }

    /// Read and, if worthwhile, compress a file from disk
    pub fn read(path: String, file: &Path, options: &AssetsConfig) -> Result<Self> {
        let content = std::fs::read(file).with_path(file)?;
        let gzip = gzip::encode(&content, options).with_path(file)?;
        Ok(Self::new(path, Bytes::from(content), gzip))
    }
}

/// All static assets of one function
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    assets: HashMap<String, Asset>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file below `dir`
    pub fn load(dir: &Path, options: &AssetsConfig) -> Result<Self> {
        let mut set = Self::new();
        for (relative, absolute) in collect(dir)? {
            set.insert(Asset::read(relative, &absolute, options)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, asset: Asset) {
        self.assets.insert(asset.path.clone(), asset);
    }

    pub fn get(&self, path: &str) -> Option<&Asset> {
        self.assets.get(path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Total size of identity bodies in bytes
    pub fn total_bytes(&self) -> usize {
        self.assets.values().map(|a| a.content.len()).sum()
    }

    /// Resolve a request path (as found in the URI) to an asset
    pub fn find(&self, url_path: &str) -> Option<&Asset> {
        let key = normalize_request_path(url_path)?;

        if key.is_empty() {
            return self.assets.get("index.html");
        }

        self.assets
            .get(&key)
            .or_else(|| self.assets.get(&format!("{key}.html")))
            .or_else(|| self.assets.get(&format!("{key}/index.html")))
    }
}

/// Walk `dir` recursively and return `(relative, absolute)` for each file
///
/// Relative paths always use `/`. Output is sorted by relative path.
/// Files whose names are not valid UTF-8 are skipped with a warning.
pub fn collect(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        match relative_key(relative) {
            Some(key) => files.push((key, entry.path().to_path_buf())),
            None => logger::log_warning(&format!(
                "Skipping asset with non UTF-8 path: {}",
                entry.path().display()
            )),
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn relative_key(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

/// Decode and normalize a URI path into an asset key
///
/// Returns `None` for paths that try to leave the asset root.
fn normalize_request_path(url_path: &str) -> Option<String> {
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;
    if decoded.contains('\\') || decoded.contains('\0') {
        return None;
    }

    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" => {}
            "." | ".." => return None,
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}

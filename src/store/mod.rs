//! Deployment store
//!
//! Layout:
//!
//! ```text
//! <store>/<function>/current                 id of the live deployment
//! <store>/<function>/<id>/manifest.json
//! <store>/<function>/<id>/<entry file>       function code, copied verbatim
//! <store>/<function>/<id>/public/<path>      raw assets
//! <store>/<function>/<id>/gzip/<path>        precompressed assets
//! ```
//!
//! A deployment directory is immutable once written. `current` is
//! replaced by rename, so readers see either the old or the new id.

mod manifest;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use hyper::body::Bytes;

use crate::assets::{self, gzip, Asset, AssetSet};
use crate::config::AssetsConfig;
use crate::error::{Error, IoResultExt, Result};
use crate::function::{self, FunctionConfig};
use crate::http::cache;
use crate::logger;

pub use manifest::{AssetEntry, Manifest, MANIFEST_FILE};

const CURRENT_FILE: &str = "current";
const PUBLIC_DIR: &str = "public";
const GZIP_DIR: &str = "gzip";

/// A loaded deployment, ready to serve
#[derive(Debug, Clone)]
pub struct Deployment {
    pub manifest: Manifest,
    pub assets: AssetSet,
}

/// One line of `edgehost ls`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSummary {
    pub name: String,
    pub current: Option<String>,
    pub deployments: usize,
}

/// Everything `deploy` needs besides the store location
#[derive(Debug, Clone)]
pub struct DeployRequest<'a> {
    pub root: &'a Path,
    pub function: &'a FunctionConfig,
    pub env: BTreeMap<String, String>,
    pub assets: &'a AssetsConfig,
    /// Deployments to retain, the new one included
    pub keep: usize,
}

/// Write a new deployment and make it current
///
/// A deployment that fails half-way is removed again, so `current`
/// only ever names complete deployments.
pub fn deploy(store: &Path, request: &DeployRequest<'_>) -> Result<Manifest> {
    let name = function::validate_name(&request.function.name)?;
    let function_dir = store.join(&name);
    std::fs::create_dir_all(&function_dir).with_path(&function_dir)?;

    let (deployment_id, deployment_dir) = create_deployment_dir(&function_dir)?;
    tracing::debug!(function = %name, id = %deployment_id, "Writing deployment");

    let manifest = match write_deployment(request, &name, &deployment_id, &deployment_dir) {
        Ok(manifest) => manifest,
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_dir_all(&deployment_dir) {
                logger::log_warning(&format!(
                    "Failed to remove incomplete deployment {}: {cleanup}",
                    deployment_dir.display()
                ));
            }
            return Err(e);
        }
    };

    set_current(&function_dir, &deployment_id)?;
    prune(store, &name, request.keep)?;

    Ok(manifest)
}

/// Fill a fresh deployment directory; the manifest is written last
fn write_deployment(
    request: &DeployRequest<'_>,
    name: &str,
    deployment_id: &str,
    deployment_dir: &Path,
) -> Result<Manifest> {
    let index = copy_entry(request.root, &request.function.index, deployment_dir)?;

    let mut entries = Vec::new();
    if let Some(public) = request.function.public_dir(request.root) {
        for (relative, absolute) in assets::collect(&public)? {
            let content = std::fs::read(&absolute).with_path(&absolute)?;
            let encoded = gzip::encode(&content, request.assets).with_path(&absolute)?;

            write_file(&deployment_dir.join(PUBLIC_DIR).join(&relative), &content)?;
            if let Some(ref encoded) = encoded {
                write_file(&deployment_dir.join(GZIP_DIR).join(&relative), encoded)?;
            }

            entries.push(AssetEntry {
                etag: cache::generate_etag(&content),
                size: content.len() as u64,
                gzip_size: encoded.as_ref().map(|e| e.len() as u64),
                path: relative,
            });
        }
    }

    let manifest = Manifest {
        function: name.to_string(),
        deployment_id: deployment_id.to_string(),
        created_at: Utc::now(),
        index,
        env: request.env.clone(),
        assets: entries,
    };
    write_file(
        &deployment_dir.join(MANIFEST_FILE),
        &serde_json::to_vec_pretty(&manifest)?,
    )?;

    Ok(manifest)
}

/// Load the current deployment of `name`
pub fn load(store: &Path, name: &str) -> Result<Deployment> {
    let name = function::validate_name(name)?;
    let function_dir = store.join(&name);
    let id = current(&function_dir)?.ok_or_else(|| Error::NoDeployment(name.clone()))?;
    let deployment_dir = function_dir.join(&id);

    let manifest_path = deployment_dir.join(MANIFEST_FILE);
    let raw = std::fs::read(&manifest_path).with_path(&manifest_path)?;
    let manifest: Manifest = serde_json::from_slice(&raw)?;

    let mut set = AssetSet::new();
    for entry in &manifest.assets {
        let path = deployment_dir.join(PUBLIC_DIR).join(&entry.path);
        let content = std::fs::read(&path).with_path(&path)?;
        let encoded = match entry.gzip_size {
            Some(_) => {
                let path = deployment_dir.join(GZIP_DIR).join(&entry.path);
                Some(Bytes::from(std::fs::read(&path).with_path(&path)?))
            }
            None => None,
        };

        let asset = Asset::new(entry.path.clone(), Bytes::from(content), encoded);
        if asset.etag != entry.etag {
            logger::log_warning(&format!(
                "Asset '{}' of {name}/{id} does not match its manifest",
                entry.path
            ));
        }
        set.insert(asset);
    }

    Ok(Deployment {
        manifest,
        assets: set,
    })
}

/// Current deployment id of every function that has one
pub fn current_ids(store: &Path) -> Result<BTreeMap<String, String>> {
    Ok(list(store)?
        .into_iter()
        .filter_map(|f| f.current.map(|id| (f.name, id)))
        .collect())
}

/// List functions in the store, sorted by name
pub fn list(store: &Path) -> Result<Vec<FunctionSummary>> {
    if !store.is_dir() {
        return Ok(Vec::new());
    }

    let mut functions = Vec::new();
    for entry in std::fs::read_dir(store).with_path(store)? {
        let entry = entry.with_path(store)?;
        let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
            continue;
        };
        if !entry.path().is_dir() || function::validate_name(&name).is_err() {
            continue;
        }

        functions.push(FunctionSummary {
            current: current(&entry.path())?,
            deployments: deployment_ids(&entry.path())?.len(),
            name,
        });
    }

    functions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(functions)
}

/// Remove all but the `keep` newest deployments; the current one always stays
pub fn prune(store: &Path, name: &str, keep: usize) -> Result<Vec<String>> {
    let function_dir = store.join(function::validate_name(name)?);
    let current = current(&function_dir)?;

    let mut ids = deployment_ids(&function_dir)?;
    ids.sort_unstable_by(|a, b| b.cmp(a));

    let mut removed = Vec::new();
    for id in ids.into_iter().skip(keep.max(1)) {
        if current.as_deref() == Some(id.as_str()) {
            continue;
        }
        let dir = function_dir.join(&id);
        std::fs::remove_dir_all(&dir).with_path(&dir)?;
        removed.push(id);
    }

    if !removed.is_empty() {
        tracing::debug!(function = name, removed = removed.len(), "Pruned old deployments");
    }
    Ok(removed)
}

fn current(function_dir: &Path) -> Result<Option<String>> {
    let path = function_dir.join(CURRENT_FILE);
    match std::fs::read_to_string(&path) {
        Ok(id) => {
            let id = id.trim();
            Ok((!id.is_empty()).then(|| id.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

fn set_current(function_dir: &Path, id: &str) -> Result<()> {
    let tmp = function_dir.join(format!("{CURRENT_FILE}.tmp"));
    std::fs::write(&tmp, id).with_path(&tmp)?;
    let path = function_dir.join(CURRENT_FILE);
    std::fs::rename(&tmp, &path).with_path(&path)
}

fn deployment_ids(function_dir: &Path) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(function_dir).with_path(function_dir)? {
        let entry = entry.with_path(function_dir)?;
        if entry.path().join(MANIFEST_FILE).is_file() {
            if let Some(id) = entry.file_name().to_str() {
                ids.push(id.to_string());
            }
        }
    }
    Ok(ids)
}

/// Timestamp ids sort chronologically; a suffix breaks same-millisecond ties
fn create_deployment_dir(function_dir: &Path) -> Result<(String, PathBuf)> {
    let base = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
    let mut attempt = 0u32;
    loop {
        let id = if attempt == 0 {
            base.clone()
        } else {
            format!("{base}-{attempt:03}")
        };
        let dir = function_dir.join(&id);
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok((id, dir)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 999 => {
                attempt += 1;
            }
            Err(e) => return Err(Error::io(dir, e)),
        }
    }
}

/// Copy the entry file, keeping its path relative to the function root
///
/// `index` must be a plain relative path; anything that could land
/// outside the deployment directory is refused.
fn copy_entry(root: &Path, index: &Path, deployment_dir: &Path) -> Result<String> {
    let source = root.join(index);
    let mut parts = Vec::new();
    for component in index.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::OutsideRoot(source));
            }
        }
    }
    if parts.is_empty() {
        return Err(Error::MissingEntry(source));
    }

    let relative = parts.join("/");
    let content = std::fs::read(&source).with_path(&source)?;
    write_file(&deployment_dir.join(&relative), &content)?;

    Ok(relative)
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_path(parent)?;
    }
    std::fs::write(path, content).with_path(path)
}

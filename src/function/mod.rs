//! Function source resolution
//!
//! A function is a directory holding an entry file (`index.ts` and
//! friends) and, optionally, a public directory of static assets. The
//! resolved settings are saved to `.edgehost/function.toml` so later
//! `deploy`/`dev` runs need no flags.

pub mod backend;
pub mod env;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};

pub use backend::{FunctionBackend, NotFoundBackend};

pub const CONFIG_DIR: &str = ".edgehost";
pub const CONFIG_FILE: &str = "function.toml";

/// Entry files tried, in order, when none is given
pub const ENTRY_CANDIDATES: &[&str] = &["index.ts", "index.tsx", "index.js", "index.jsx", "index.mjs"];

/// Saved function settings, paths relative to the function root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub name: String,
    pub index: PathBuf,
    #[serde(default)]
    pub public: Option<PathBuf>,
}

impl FunctionConfig {
    /// Absolute public directory, if the function has one
    pub fn public_dir(&self, root: &Path) -> Option<PathBuf> {
        self.public.as_ref().map(|p| root.join(p))
    }
}

/// Options coming from the command line
#[derive(Debug, Default, Clone)]
pub struct ResolveOptions {
    pub name: Option<String>,
    pub index: Option<PathBuf>,
    pub public: Option<PathBuf>,
}

/// Resolve a function from a path and CLI overrides
///
/// `path` is either the function root or its entry file. Saved settings
/// are loaded first; explicit options win over them. Relative `index`
/// and `public` values are taken relative to the function root, never
/// the working directory, and both must stay inside the root.
pub fn resolve(path: &Path, opts: &ResolveOptions) -> Result<(PathBuf, FunctionConfig)> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let (root, entry_from_path) = if path.is_file() {
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        (root, path.file_name().map(PathBuf::from))
    } else {
        (path.to_path_buf(), None)
    };
    let root = root.canonicalize().with_path(&root)?;

    let saved = load(&root)?;

    let index = match opts.index.clone().or(entry_from_path) {
        Some(index) => index,
        None => match saved.as_ref().map(|s| s.index.clone()) {
            Some(index) => index,
            None => detect_entry(&root)?,
        },
    };
    if !root.join(&index).is_file() {
        return Err(Error::MissingEntry(root.join(&index)));
    }
    let index = inside_root(&root, &index)?;

    let public = match opts
        .public
        .clone()
        .or_else(|| saved.as_ref().and_then(|s| s.public.clone()))
    {
        Some(public) => {
            let dir = root.join(&public);
            if !dir.is_dir() {
                return Err(Error::NotADirectory(dir));
            }
            Some(inside_root(&root, &public)?)
        }
        None => None,
    };

    let name = match opts.name.as_deref() {
        Some(name) => validate_name(name)?,
        None => match saved.map(|s| s.name) {
            Some(name) => name,
            None => slugify(
                root.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default(),
            )
            .ok_or_else(|| Error::InvalidName(root.display().to_string()))?,
        },
    };

    Ok((root, FunctionConfig { name, index, public }))
}

/// Load `.edgehost/function.toml` if present
pub fn load(root: &Path) -> Result<Option<FunctionConfig>> {
    let path = root.join(CONFIG_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path).with_path(&path)?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| Error::FunctionConfig(e.to_string()))
}

/// Write `.edgehost/function.toml`
pub fn save(root: &Path, cfg: &FunctionConfig) -> Result<()> {
    let dir = root.join(CONFIG_DIR);
    std::fs::create_dir_all(&dir).with_path(&dir)?;
    let raw = toml::to_string_pretty(cfg).map_err(|e| Error::FunctionConfig(e.to_string()))?;
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, raw).with_path(&path)
}

fn detect_entry(root: &Path) -> Result<PathBuf> {
    ENTRY_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| root.join(candidate).is_file())
        .ok_or_else(|| Error::MissingEntry(root.to_path_buf()))
}

/// `path` (relative to `root`, or absolute) as a path relative to `root`
///
/// `root` must be canonical. Symlinks and `..` are resolved first, so a
/// path that ends up elsewhere is rejected.
fn inside_root(root: &Path, path: &Path) -> Result<PathBuf> {
    let joined = root.join(path);
    let absolute = joined.canonicalize().with_path(&joined)?;
    match absolute.strip_prefix(root) {
        Ok(relative) => Ok(relative.to_path_buf()),
        Err(_) => Err(Error::OutsideRoot(absolute)),
    }
}

/// Lowercase, `[a-z0-9-]`, no leading/trailing/double dashes
pub fn slugify(raw: &str) -> Option<String> {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    (!slug.is_empty()).then_some(slug)
}

/// Names become DNS labels under `serve`, so they must already be slugs
pub fn validate_name(name: &str) -> Result<String> {
    match slugify(name) {
        Some(slug) if slug == name && slug.len() <= 63 => Ok(slug),
        _ => Err(Error::InvalidName(name.to_string())),
    }
}

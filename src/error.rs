//! Error types
//!
//! A single error enum shared by the CLI commands, the deployment store
//! and the server bootstrap. Request handling never surfaces these to
//! clients; it maps failures to HTTP status codes instead.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no entry file found in {}", .0.display())]
    MissingEntry(PathBuf),

    #[error("public path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("path lies outside the function root: {}", .0.display())]
    OutsideRoot(PathBuf),

    #[error("function '{0}' has no deployment")]
    NoDeployment(String),

    #[error("invalid function name '{0}'")]
    InvalidName(String),

    #[error("invalid env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Server(#[from] std::io::Error),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("invalid function config: {0}")]
    FunctionConfig(String),

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Extension for tagging `std::io::Result` with the path involved.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| Error::io(path, e))
    }
}

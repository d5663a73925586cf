//! Error types for lopper-fs

use std::path::PathBuf;

/// Result type for lopper-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lopper-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path {path} resolves outside of repository root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

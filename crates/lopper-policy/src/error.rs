//! Error types for lopper-policy

use std::path::PathBuf;

/// Result type for lopper-policy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure categories surfaced at the command boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    ConfigNotFound,
    ConfigRead,
    Parse,
    DuplicateField,
    Cycle,
    RemoteFetch,
    Integrity,
    Validation,
}

/// Errors that can occur while resolving a policy.
///
/// Every variant is terminal: resolution never returns a partial result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Repository root could not be inspected
    #[error("Repository root {path} is not accessible: {source}")]
    RepoRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration exists but could not be read as a file
    #[error("Failed to read configuration {path}: {message}")]
    ConfigRead { path: PathBuf, message: String },

    /// Local reference escapes the repository root
    #[error("Policy file {path} is outside repository root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// Malformed syntax, unknown field or multiple JSON values
    #[error("Failed to parse {format} policy {source_id}: {message}")]
    Parse {
        source_id: String,
        format: &'static str,
        message: String,
    },

    /// A threshold is set both at document root and under `thresholds`
    #[error("Invalid policy {source_id}: field {field} is defined more than once")]
    DuplicateField { source_id: String, field: &'static str },

    /// A pack import that is neither a local path nor an http(s) URL
    #[error("Invalid policy pack reference {reference:?}: {message}")]
    InvalidReference { reference: String, message: String },

    /// Import chain revisits a document already being expanded
    #[error("Policy pack import cycle detected: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    /// Import chain is deeper than the configured bound
    #[error("Policy pack imports nested deeper than {max_depth} levels: {}", chain.join(" -> "))]
    ImportTooDeep { max_depth: usize, chain: Vec<String> },

    /// Network failure, non-success status or oversize body
    #[error("Failed to fetch policy pack {url}: {message}")]
    RemoteFetch { url: String, message: String },

    /// Caller cancelled an in-flight fetch
    #[error("Fetch of policy pack {url} was cancelled")]
    Cancelled { url: String },

    /// Missing or malformed pin, or digest mismatch
    #[error("Integrity check failed for policy pack {reference}: {message}")]
    Integrity { reference: String, message: String },

    /// Out-of-range or otherwise invalid resolved value
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Filesystem error from lopper-fs
    #[error(transparent)]
    Fs(#[from] lopper_fs::Error),
}

impl Error {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn integrity(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Integrity {
            reference: reference.into(),
            message: message.into(),
        }
    }

    pub(crate) fn remote_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Classify this error into its reporting category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RepoRoot { .. } => ErrorKind::Io,
            Self::ConfigNotFound { .. } => ErrorKind::ConfigNotFound,
            Self::ConfigRead { .. } | Self::OutsideRoot { .. } => ErrorKind::ConfigRead,
            Self::Parse { .. } | Self::InvalidReference { .. } => ErrorKind::Parse,
            Self::DuplicateField { .. } => ErrorKind::DuplicateField,
            Self::Cycle { .. } | Self::ImportTooDeep { .. } => ErrorKind::Cycle,
            Self::RemoteFetch { .. } | Self::Cancelled { .. } => ErrorKind::RemoteFetch,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Fs(lopper_fs::Error::OutsideRoot { .. }) => ErrorKind::ConfigRead,
            Self::Fs(lopper_fs::Error::Io { .. }) => ErrorKind::Io,
        }
    }
}

//! Normalized path handling with lexical cleaning

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to forward slashes and lexically cleaned.
///
/// Cleaning collapses repeated separators, drops `.` components and
/// resolves `..` against the preceding component. On rooted paths a `..`
/// at the root is dropped; on relative paths leading `..` components are
/// kept so that joins can still be checked against a root afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str.replace('\\', "/")),
        }
    }

    /// Make `path` absolute against the current directory, then clean it.
    pub fn absolute(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::new(absolute))
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment and clean the result.
    ///
    /// An absolute segment replaces this path entirely.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        if root_prefix(&segment).is_some() {
            return Self {
                inner: clean(&segment),
            };
        }
        Self {
            inner: clean(&format!("{}/{}", self.inner, segment)),
        }
    }

    /// Whether the path is rooted (`/...` or a drive prefix like `C:/`).
    pub fn is_absolute(&self) -> bool {
        root_prefix(&self.inner).is_some()
    }

    /// Component-wise prefix check against `base`.
    pub fn starts_with(&self, base: &NormalizedPath) -> bool {
        if self.inner == base.inner {
            return true;
        }
        let prefix = if base.inner.ends_with('/') {
            base.inner.clone()
        } else {
            format!("{}/", base.inner)
        };
        self.inner.starts_with(&prefix)
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        // Cleaned paths only end in a separator when they are a root.
        if self.inner.ends_with('/') {
            return None;
        }
        match self.inner.rfind('/') {
            Some(idx) if self.inner[..idx].ends_with(':') => Some(Self {
                inner: self.inner[..=idx].to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

/// Returns the root prefix (`/` or `X:/`) of a slash-normalized path.
fn root_prefix(path: &str) -> Option<&str> {
    if path.starts_with('/') {
        return Some("/");
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/')
    {
        return Some(&path[..bytes.len().min(3)]);
    }
    None
}

fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let prefix = root_prefix(path).unwrap_or("");
    let rooted = !prefix.is_empty();
    let mut parts: Vec<&str> = Vec::new();

    for component in path[prefix.len()..].split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let body = parts.join("/");
    if rooted {
        let prefix = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };
        format!("{prefix}{body}")
    } else if body.is_empty() {
        ".".to_string()
    } else {
        body
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

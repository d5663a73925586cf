//! Byte-level reads, optionally sandboxed to a repository root

use std::fs;

use crate::{Error, NormalizedPath, Result};

/// Read the full contents of a file without any sandboxing.
pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    fs::read(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Reads files only when they live under a fixed root directory.
///
/// The check is done twice: lexically on the cleaned path, and again on
/// the symlink-resolved target so a link inside the root cannot point
/// outside of it.
#[derive(Debug, Clone)]
pub struct SandboxedReader {
    root: NormalizedPath,
}

impl SandboxedReader {
    pub fn new(root: NormalizedPath) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Whether `path` is lexically inside the root.
    pub fn contains(&self, path: &NormalizedPath) -> bool {
        path.starts_with(&self.root)
    }

    /// Read `path`, failing with [`Error::OutsideRoot`] if it escapes the root.
    pub fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        if !self.contains(path) {
            return Err(self.outside(path));
        }

        let native_root = self.root.to_native();
        let native_path = path.to_native();
        let real_root =
            dunce::canonicalize(&native_root).map_err(|e| Error::io(&native_root, e))?;
        let real_path =
            dunce::canonicalize(&native_path).map_err(|e| Error::io(&native_path, e))?;

        if !real_path.starts_with(&real_root) {
            tracing::debug!(path = %path, target = %real_path.display(), "symlink escapes root");
            return Err(self.outside(path));
        }

        fs::read(&real_path).map_err(|e| Error::io(&native_path, e))
    }

    fn outside(&self, path: &NormalizedPath) -> Error {
        Error::OutsideRoot {
            path: path.to_native(),
            root: self.root.to_native(),
        }
    }
}

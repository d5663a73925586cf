//! Locating the repository configuration document

use std::fs::{self, File};
use std::io;
use std::path::Path;

use lopper_fs::{ConfigFile, NormalizedPath};

use crate::{Error, Result};

/// Finds the configuration document backing a repository.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    root: NormalizedPath,
}

impl ConfigLocator {
    /// Create a locator for `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let metadata = fs::metadata(root).map_err(|source| Error::RepoRoot {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(Error::RepoRoot {
                path: root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        Ok(Self {
            root: NormalizedPath::absolute(root)?,
        })
    }

    /// Absolute, cleaned repository root.
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Resolve the configuration path.
    ///
    /// An explicit path is resolved against the root and must name a
    /// readable file. Without one, the well-known names are probed in
    /// [`ConfigFile::DISCOVERY_ORDER`]; finding none yields `Ok(None)`.
    pub fn locate(&self, explicit: Option<&Path>) -> Result<Option<NormalizedPath>> {
        match explicit {
            Some(path) => self.explicit(path).map(Some),
            None => Ok(self.discover()),
        }
    }

    fn explicit(&self, path: &Path) -> Result<NormalizedPath> {
        let requested = NormalizedPath::new(path);
        let resolved = if requested.is_absolute() {
            requested
        } else {
            self.root.join(requested.as_str())
        };
        let native = resolved.to_native();

        let metadata = match fs::metadata(&native) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: native });
            }
            Err(e) => {
                return Err(Error::ConfigRead {
                    path: native,
                    message: e.to_string(),
                });
            }
        };
        if metadata.is_dir() {
            return Err(Error::ConfigRead {
                path: native,
                message: "is a directory".to_string(),
            });
        }
        File::open(&native).map_err(|e| Error::ConfigRead {
            path: native.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(config = %resolved, "Using explicit config");
        Ok(resolved)
    }

    fn discover(&self) -> Option<NormalizedPath> {
        let found = ConfigFile::DISCOVERY_ORDER
            .iter()
            .map(|name| self.root.join(name.as_str()))
            .find(|candidate| candidate.is_file());
        match &found {
            Some(path) => tracing::debug!(config = %path, "Discovered config"),
            None => tracing::debug!(root = %self.root, "No config found, using defaults"),
        }
        found
    }
}

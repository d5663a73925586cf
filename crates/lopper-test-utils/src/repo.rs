//! [`TestRepo`] builder for policy resolution scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary repository directory with helpers for writing policy files.
///
/// # Example
///
/// ```rust,no_run
/// use lopper_test_utils::repo::TestRepo;
///
/// let repo = TestRepo::new();
/// repo.write(".lopper.yml", "thresholds:\n  fail_on_increase_percent: 4\n");
/// assert!(repo.path().join(".lopper.yml").is_file());
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// Create an empty temporary repository.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap_or_else(|e| panic!("TestRepo: tempdir failed: {e}")),
        }
    }

    /// Root of the repository.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `relative`, creating parent directories.
    ///
    /// # Panics
    /// Panics if the filesystem operations fail.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("TestRepo: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestRepo: failed to write {}: {e}", path.display()));
        path
    }

    /// Create an empty directory at `relative`.
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path().join(relative);
        fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("TestRepo: failed to create {}: {e}", path.display()));
        path
    }

    /// Absolute path string of `relative`, as it appears in policy sources.
    pub fn source_id(&self, relative: &str) -> String {
        let absolute = std::path::absolute(self.path().join(relative))
            .unwrap_or_else(|e| panic!("TestRepo: absolute path failed: {e}"));
        absolute.to_string_lossy().replace('\\', "/")
    }
}

//! Resolution limits

use std::time::Duration;

/// Default per-request timeout for remote packs.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cap on a remote pack body.
pub const DEFAULT_MAX_REMOTE_BYTES: u64 = 1024 * 1024;

/// Default bound on nested imports.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 32;

/// Limits applied while resolving a policy graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub fetch_timeout: Duration,
    pub max_remote_bytes: u64,
    pub max_import_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_remote_bytes: DEFAULT_MAX_REMOTE_BYTES,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}

impl ResolveOptions {
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_remote_bytes(mut self, max_bytes: u64) -> Self {
        self.max_remote_bytes = max_bytes;
        self
    }

    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }
}

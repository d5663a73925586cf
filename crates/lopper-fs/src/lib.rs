//! Filesystem primitives for lopper
//!
//! Provides lexical path cleaning, a repository-root sandboxed reader and
//! the SHA-256 helpers used for pack pinning.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use constants::ConfigFile;
pub use error::{Error, Result};
pub use io::SandboxedReader;
pub use path::NormalizedPath;

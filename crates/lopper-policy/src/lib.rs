//! Hierarchical policy resolution for lopper
//!
//! Determines the thresholds, removal-candidate weights and path scope
//! governing one analysis run by merging, from highest to lowest
//! precedence:
//!
//! 1. **CLI flags** - applied by the caller via
//!    [`ResolutionResult::with_cli_overrides`]
//! 2. **Repository config** - explicit path, or `.lopper.yml`,
//!    `.lopper.yaml`, `lopper.json` in that order
//! 3. **Policy packs** - transitively imported through `policy.packs`,
//!    later packs overriding earlier ones; remote packs must be pinned
//!    with `#sha256=<hex>`
//! 4. **Built-in defaults** - [`Values::default`]
//!
//! Any failure aborts the whole resolution; there is no partial result.
//!
//! # Example
//!
//! ```ignore
//! use lopper_policy::{PolicyLoader, ResolveOptions};
//!
//! let loader = PolicyLoader::new(ResolveOptions::default())?;
//! let result = loader.load("/path/to/repo", None)?;
//! println!("sources: {:?}", result.policy_sources());
//! ```

pub mod document;
pub mod error;
pub mod fetch;
pub mod locator;
pub mod options;
pub mod reference;
pub mod resolver;
pub mod result;
pub mod scope;
pub mod values;

pub use document::{DocumentFormat, PolicyDocument};
pub use error::{Error, ErrorKind, Result};
pub use fetch::{CancelToken, HttpFetcher, PackFetcher, verify_pin};
pub use locator::ConfigLocator;
pub use options::ResolveOptions;
pub use reference::{PinnedUrl, PolicyRef};
pub use resolver::{PackLayer, PackResolver, PolicyLoader};
pub use result::{
    CLI_SOURCE, DEFAULTS_SOURCE, EffectivePolicy, EffectiveThresholds, PolicyReport,
    ResolutionResult,
};
pub use scope::PathScope;
pub use values::{LockfileDriftPolicy, Overrides, Values};

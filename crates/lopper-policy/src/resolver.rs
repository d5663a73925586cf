//! Recursive policy pack resolution with hierarchical merge
//!
//! A document's layer is built by folding its imports in declared order,
//! so a later pack overrides an earlier one, and then placing the
//! document's own values on top:
//!
//! ```text
//! importing document  (highest)
//! last pack in policy.packs
//! ...
//! first pack in policy.packs
//! built-in defaults   (lowest)
//! ```
//!
//! Imports are re-read for every path that reaches them; only a reference
//! already being expanded on the current chain is an error (a cycle).

use std::path::Path;

use lopper_fs::{NormalizedPath, SandboxedReader};

use crate::document::PolicyDocument;
use crate::fetch::{CancelToken, HttpFetcher, PackFetcher, verify_pin};
use crate::locator::ConfigLocator;
use crate::options::ResolveOptions;
use crate::reference::PolicyRef;
use crate::result::ResolutionResult;
use crate::scope::PathScope;
use crate::values::Overrides;
use crate::{Error, Result};

/// Merged result of one document and everything it imports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackLayer {
    pub overrides: Overrides,
    pub scope: PathScope,
    /// Canonical ids, lowest precedence first
    pub sources: Vec<String>,
}

impl PackLayer {
    /// Place `higher` on top of this layer.
    fn merge(&mut self, higher: PackLayer) {
        self.overrides.merge(&higher.overrides);
        self.scope.merge(&higher.scope);
        self.sources.extend(higher.sources);
    }
}

/// Expands an import graph for a single resolution call.
///
/// The stack of references currently being expanded lives on the
/// instance, so separate resolutions never observe each other.
pub struct PackResolver<'a> {
    reader: SandboxedReader,
    fetcher: &'a dyn PackFetcher,
    options: ResolveOptions,
    cancel: CancelToken,
    stack: Vec<String>,
}

impl<'a> PackResolver<'a> {
    pub fn new(
        root: NormalizedPath,
        fetcher: &'a dyn PackFetcher,
        options: ResolveOptions,
        cancel: CancelToken,
    ) -> Self {
        Self {
            reader: SandboxedReader::new(root),
            fetcher,
            options,
            cancel,
            stack: Vec::new(),
        }
    }

    /// Resolve `reference` and all of its transitive imports.
    ///
    /// Local reads are confined to the repository root unless
    /// `outside_root` is set, which is only the case for chains that start
    /// at an explicitly requested out-of-root config.
    pub fn resolve(&mut self, reference: &PolicyRef, outside_root: bool) -> Result<PackLayer> {
        self.stack.clear();
        self.resolve_file(reference, outside_root)
    }

    fn resolve_file(&mut self, reference: &PolicyRef, outside_root: bool) -> Result<PackLayer> {
        let id = reference.id().to_string();

        if self.stack.contains(&id) {
            let mut chain = self.stack.clone();
            chain.push(id);
            return Err(Error::Cycle { chain });
        }
        if self.stack.len() >= self.options.max_import_depth {
            let mut chain = self.stack.clone();
            chain.push(id);
            return Err(Error::ImportTooDeep {
                max_depth: self.options.max_import_depth,
                chain,
            });
        }

        self.stack.push(id);
        let result = self.expand(reference, outside_root);
        self.stack.pop();
        result
    }

    fn expand(&mut self, reference: &PolicyRef, outside_root: bool) -> Result<PackLayer> {
        let bytes = self.load(reference, outside_root)?;
        let document = PolicyDocument::parse(&bytes, reference.format(), reference.id())?;
        document.overrides.validate()?;
        tracing::debug!(
            source = %reference,
            packs = document.packs.len(),
            "Loaded policy document"
        );

        let mut layer = PackLayer::default();
        for raw in &document.packs {
            let import = reference.resolve_import(raw)?;
            tracing::debug!(importer = %reference, pack = %import, "Resolving policy pack");
            let imported = self.resolve_file(&import, outside_root)?;
            layer.merge(imported);
        }

        tracing::trace!(source = %reference, "Applying document values over imported packs");
        layer.merge(PackLayer {
            overrides: document.overrides,
            scope: document.scope,
            sources: vec![reference.id().to_string()],
        });
        dedup_stable(&mut layer.sources);
        Ok(layer)
    }

    fn load(&self, reference: &PolicyRef, outside_root: bool) -> Result<Vec<u8>> {
        match reference {
            PolicyRef::Local(path) => {
                let read = if outside_root {
                    lopper_fs::io::read_bytes(path)
                } else {
                    self.reader.read(path)
                };
                read.map_err(local_read_error)
            }
            PolicyRef::Remote(pinned) => {
                let url = pinned.fetch_url();
                if self.cancel.is_cancelled() {
                    return Err(Error::Cancelled {
                        url: url.to_string(),
                    });
                }
                let bytes = self.fetcher.fetch(&url, &self.cancel)?;
                if bytes.len() as u64 > self.options.max_remote_bytes {
                    return Err(Error::remote_fetch(
                        url.as_str(),
                        format!(
                            "response body exceeds {} bytes",
                            self.options.max_remote_bytes
                        ),
                    ));
                }
                verify_pin(&bytes, pinned)?;
                Ok(bytes)
            }
        }
    }
}

fn local_read_error(error: lopper_fs::Error) -> Error {
    match error {
        lopper_fs::Error::OutsideRoot { path, root } => Error::OutsideRoot { path, root },
        lopper_fs::Error::Io { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
            Error::ConfigNotFound { path }
        }
        lopper_fs::Error::Io { path, source } => Error::ConfigRead {
            path,
            message: source.to_string(),
        },
    }
}

/// Remove repeated entries, keeping the first occurrence of each.
pub(crate) fn dedup_stable(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

/// Entry point for resolving the effective policy of a repository.
pub struct PolicyLoader {
    options: ResolveOptions,
    fetcher: Box<dyn PackFetcher>,
    cancel: CancelToken,
}

impl PolicyLoader {
    /// Create a loader that fetches remote packs over HTTP(S).
    pub fn new(options: ResolveOptions) -> Result<Self> {
        let fetcher = HttpFetcher::new(options.fetch_timeout, options.max_remote_bytes)?;
        Ok(Self::with_fetcher(options, fetcher))
    }

    /// Create a loader with a custom remote transport.
    pub fn with_fetcher(options: ResolveOptions, fetcher: impl PackFetcher + 'static) -> Self {
        Self {
            options,
            fetcher: Box::new(fetcher),
            cancel: CancelToken::new(),
        }
    }

    /// Abort remote fetches when `cancel` fires.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolve the policy for the repository at `root`.
    ///
    /// `explicit` is the user-supplied config path, if any. Without a
    /// config document the result holds only the defaults.
    pub fn load(&self, root: impl AsRef<Path>, explicit: Option<&Path>) -> Result<ResolutionResult> {
        let locator = ConfigLocator::new(root)?;
        let Some(config_path) = locator.locate(explicit)? else {
            return Ok(ResolutionResult::defaults());
        };

        let outside_root = !config_path.starts_with(locator.root());
        if outside_root {
            tracing::debug!(config = %config_path, "Config lives outside repository root");
        }

        let mut resolver = PackResolver::new(
            locator.root().clone(),
            self.fetcher.as_ref(),
            self.options,
            self.cancel.clone(),
        );
        let layer = resolver.resolve(&PolicyRef::Local(config_path.clone()), outside_root)?;
        ResolutionResult::from_layer(layer, Some(config_path))
    }
}

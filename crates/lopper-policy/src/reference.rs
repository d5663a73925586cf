//! Policy pack references and their canonical identities
//!
//! A reference is either a local file or an `http(s)` URL pinned with a
//! `#sha256=<hex>` fragment. Two references denote the same node of the
//! import graph exactly when their [`PolicyRef::id`] values are equal.

use std::fmt;

use lopper_fs::NormalizedPath;
use lopper_fs::checksum::is_sha256_hex;
use reqwest::Url;

use crate::document::DocumentFormat;
use crate::{Error, Result};

const PIN_PREFIX: &str = "sha256=";

/// An `http(s)` URL carrying a validated SHA-256 pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedUrl {
    /// URL with the fragment rewritten to `sha256=<lowercase hex>`
    url: Url,
    digest: String,
}

impl PinnedUrl {
    /// Parse an absolute pinned URL.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| Error::InvalidReference {
            reference: raw.to_string(),
            message: e.to_string(),
        })?;
        Self::from_url(url, raw)
    }

    fn from_url(mut url: Url, raw: &str) -> Result<Self> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::InvalidReference {
                reference: raw.to_string(),
                message: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        let fragment = url.fragment().unwrap_or("").to_ascii_lowercase();
        let digest = fragment
            .strip_prefix(PIN_PREFIX)
            .filter(|hex| is_sha256_hex(hex))
            .ok_or_else(|| {
                Error::integrity(
                    raw,
                    "remote policy packs must be pinned with #sha256=<64 hex characters>",
                )
            })?
            .to_string();

        url.set_fragment(Some(&format!("{PIN_PREFIX}{digest}")));
        Ok(Self { url, digest })
    }

    /// Canonical identity, including the normalized pin fragment.
    pub fn id(&self) -> &str {
        self.url.as_str()
    }

    /// Expected lowercase hex digest of the document body.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The URL to request, with the pin fragment stripped.
    pub fn fetch_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }

    fn extension(&self) -> Option<&str> {
        let name = self.url.path_segments()?.next_back()?;
        let idx = name.rfind('.')?;
        if idx == 0 { None } else { Some(&name[idx + 1..]) }
    }
}

/// A node of the policy import graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRef {
    Local(NormalizedPath),
    Remote(PinnedUrl),
}

impl PolicyRef {
    /// Canonical identity used for cycle detection and source lists.
    pub fn id(&self) -> &str {
        match self {
            Self::Local(path) => path.as_str(),
            Self::Remote(pinned) => pinned.id(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Document format implied by the path or URL extension.
    pub fn format(&self) -> DocumentFormat {
        let extension = match self {
            Self::Local(path) => path.extension(),
            Self::Remote(pinned) => pinned.extension(),
        };
        DocumentFormat::from_extension(extension)
    }

    /// Resolve an entry of `policy.packs` declared inside `self`.
    ///
    /// Absolute URLs stand alone. Anything else is relative to the
    /// importing document: its directory for local files, its URL (without
    /// fragment) for remote ones.
    pub fn resolve_import(&self, raw: &str) -> Result<PolicyRef> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidReference {
                reference: raw.to_string(),
                message: "empty reference".to_string(),
            });
        }

        if has_http_scheme(trimmed) {
            return PinnedUrl::parse(trimmed).map(Self::Remote);
        }
        if trimmed.contains("://") {
            return Err(Error::InvalidReference {
                reference: raw.to_string(),
                message: "only local paths and http(s) URLs are supported".to_string(),
            });
        }

        match self {
            Self::Local(path) => {
                let dir = path.parent().unwrap_or_else(|| path.clone());
                Ok(Self::Local(dir.join(trimmed)))
            }
            Self::Remote(pinned) => {
                let joined = pinned
                    .fetch_url()
                    .join(trimmed)
                    .map_err(|e| Error::InvalidReference {
                        reference: raw.to_string(),
                        message: e.to_string(),
                    })?;
                PinnedUrl::from_url(joined, trimmed).map(Self::Remote)
            }
        }
    }
}

fn has_http_scheme(raw: &str) -> bool {
    let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl fmt::Display for PolicyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

//! Strict decoding of a single policy document
//!
//! Documents are YAML or JSON, chosen by extension. Unknown fields are
//! rejected, and each threshold may appear either at the document root
//! (the legacy layout) or under `thresholds`, but not in both places.
//! An empty, comment-only or `null` document is an empty policy.
//!
//! ```yaml
//! policy:
//!   packs:
//!     - packs/base.yml
//!     - https://example.com/org.yml#sha256=<64 hex>
//! scope:
//!   include: ["src/**"]
//!   exclude: ["vendor/**"]
//! thresholds:
//!   fail_on_increase_percent: 2
//!   lockfile_drift_policy: fail
//! ```

use serde::Deserialize;

use crate::scope::PathScope;
use crate::values::Overrides;
use crate::{Error, Result};

/// Serialization format of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` selects JSON; every other extension is read as YAML.
    pub fn from_extension(extension: Option<&str>) -> Self {
        match extension {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPolicy {
    #[serde(default)]
    packs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScope {
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThresholds {
    fail_on_increase_percent: Option<i64>,
    low_confidence_warning_percent: Option<i64>,
    min_usage_percent_for_recommendations: Option<i64>,
    removal_candidate_weight_usage: Option<f64>,
    removal_candidate_weight_impact: Option<f64>,
    removal_candidate_weight_confidence: Option<f64>,
    lockfile_drift_policy: Option<String>,
}

// `deny_unknown_fields` cannot be combined with `flatten`, so the legacy
// root-level leaves are spelled out again here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    policy: Option<RawPolicy>,
    scope: Option<RawScope>,
    thresholds: Option<RawThresholds>,
    fail_on_increase_percent: Option<i64>,
    low_confidence_warning_percent: Option<i64>,
    min_usage_percent_for_recommendations: Option<i64>,
    removal_candidate_weight_usage: Option<f64>,
    removal_candidate_weight_impact: Option<f64>,
    removal_candidate_weight_confidence: Option<f64>,
    lockfile_drift_policy: Option<String>,
}

/// A decoded policy document: its imports, scope and threshold layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyDocument {
    /// Raw `policy.packs` entries in file order
    pub packs: Vec<String>,
    pub scope: PathScope,
    pub overrides: Overrides,
}

impl PolicyDocument {
    /// Decode `bytes` as `format`. `source_id` is only used in errors.
    pub fn parse(bytes: &[u8], format: DocumentFormat, source_id: &str) -> Result<Self> {
        let raw = match format {
            DocumentFormat::Json => decode_json(bytes, source_id)?,
            DocumentFormat::Yaml => decode_yaml(bytes, source_id)?,
        };
        Self::from_raw(raw, source_id)
    }

    fn from_raw(raw: RawDocument, source_id: &str) -> Result<Self> {
        let nested = raw.thresholds.unwrap_or_default();

        let lockfile_drift_policy = pick(
            source_id,
            "lockfile_drift_policy",
            raw.lockfile_drift_policy,
            nested.lockfile_drift_policy,
        )?
        .map(|value| value.parse())
        .transpose()?;

        let overrides = Overrides {
            fail_on_increase_percent: pick(
                source_id,
                "fail_on_increase_percent",
                raw.fail_on_increase_percent,
                nested.fail_on_increase_percent,
            )?,
            low_confidence_warning_percent: pick(
                source_id,
                "low_confidence_warning_percent",
                raw.low_confidence_warning_percent,
                nested.low_confidence_warning_percent,
            )?,
            min_usage_percent_for_recommendations: pick(
                source_id,
                "min_usage_percent_for_recommendations",
                raw.min_usage_percent_for_recommendations,
                nested.min_usage_percent_for_recommendations,
            )?,
            removal_candidate_weight_usage: pick(
                source_id,
                "removal_candidate_weight_usage",
                raw.removal_candidate_weight_usage,
                nested.removal_candidate_weight_usage,
            )?,
            removal_candidate_weight_impact: pick(
                source_id,
                "removal_candidate_weight_impact",
                raw.removal_candidate_weight_impact,
                nested.removal_candidate_weight_impact,
            )?,
            removal_candidate_weight_confidence: pick(
                source_id,
                "removal_candidate_weight_confidence",
                raw.removal_candidate_weight_confidence,
                nested.removal_candidate_weight_confidence,
            )?,
            lockfile_drift_policy,
        };

        let scope = raw.scope.unwrap_or_default();
        Ok(Self {
            packs: raw.policy.unwrap_or_default().packs,
            scope: PathScope::new(scope.include, scope.exclude),
            overrides,
        })
    }
}

fn pick<T>(
    source_id: &str,
    field: &'static str,
    root: Option<T>,
    nested: Option<T>,
) -> Result<Option<T>> {
    match (root, nested) {
        (Some(_), Some(_)) => Err(Error::DuplicateField {
            source_id: source_id.to_string(),
            field,
        }),
        (root, nested) => Ok(root.or(nested)),
    }
}

fn decode_json(bytes: &[u8], source_id: &str) -> Result<RawDocument> {
    let parse_error = |message: String| Error::Parse {
        source_id: source_id.to_string(),
        format: DocumentFormat::Json.name(),
        message,
    };

    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let raw = Option::<RawDocument>::deserialize(&mut deserializer)
        .map_err(|e| parse_error(e.to_string()))?;
    deserializer
        .end()
        .map_err(|e| parse_error(format!("document must contain a single JSON value ({e})")))?;
    Ok(raw.unwrap_or_default())
}

fn decode_yaml(bytes: &[u8], source_id: &str) -> Result<RawDocument> {
    if is_blank_yaml(bytes) {
        return Ok(RawDocument::default());
    }
    let raw: Option<RawDocument> = serde_yaml::from_slice(bytes).map_err(|e| Error::Parse {
        source_id: source_id.to_string(),
        format: DocumentFormat::Yaml.name(),
        message: e.to_string(),
    })?;
    Ok(raw.unwrap_or_default())
}

/// Whitespace- or comment-only YAML decodes to an empty document.
fn is_blank_yaml(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes).lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

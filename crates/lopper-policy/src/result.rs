//! The resolved policy handed to the CLI and report rendering

use lopper_fs::NormalizedPath;
use serde::Serialize;

use crate::Result;
use crate::resolver::{PackLayer, dedup_stable};
use crate::scope::PathScope;
use crate::values::{LockfileDriftPolicy, Overrides, Values};

/// Source label for built-in defaults; always the last source.
pub const DEFAULTS_SOURCE: &str = "defaults";

/// Source label for command-line overrides.
pub const CLI_SOURCE: &str = "cli";

/// Outcome of resolving a repository's policy.
///
/// Values are validated before a result is constructed, and the result is
/// not mutated afterwards; layering CLI flags produces a new result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    overrides: Overrides,
    values: Values,
    scope: PathScope,
    config_path: Option<NormalizedPath>,
    policy_sources: Vec<String>,
}

impl ResolutionResult {
    /// Result for a repository without any config document.
    pub fn defaults() -> Self {
        Self {
            overrides: Overrides::default(),
            values: Values::default(),
            scope: PathScope::default(),
            config_path: None,
            policy_sources: vec![DEFAULTS_SOURCE.to_string()],
        }
    }

    pub(crate) fn from_layer(layer: PackLayer, config_path: Option<NormalizedPath>) -> Result<Self> {
        let values = Values::default().apply(&layer.overrides);
        values.validate()?;

        let mut policy_sources: Vec<String> = layer.sources.into_iter().rev().collect();
        policy_sources.push(DEFAULTS_SOURCE.to_string());
        dedup_stable(&mut policy_sources);

        Ok(Self {
            overrides: layer.overrides,
            values,
            scope: layer.scope,
            config_path,
            policy_sources,
        })
    }

    /// Apply command-line overrides as the highest-precedence layer.
    ///
    /// The flags are validated on their own and the combined values are
    /// validated again. When any flag is set, [`CLI_SOURCE`] becomes the
    /// first policy source.
    pub fn with_cli_overrides(mut self, cli: &Overrides) -> Result<Self> {
        cli.validate()?;
        if cli.is_empty() {
            return Ok(self);
        }

        let values = self.values.apply(cli);
        values.validate()?;

        self.overrides.merge(cli);
        self.values = values;
        self.policy_sources.insert(0, CLI_SOURCE.to_string());
        dedup_stable(&mut self.policy_sources);
        Ok(self)
    }

    /// Merged explicitly-set fields from every layer.
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn scope(&self) -> &PathScope {
        &self.scope
    }

    /// The repository config document, if one was found.
    pub fn config_path(&self) -> Option<&NormalizedPath> {
        self.config_path.as_ref()
    }

    /// Sources from highest to lowest precedence, ending in `"defaults"`.
    pub fn policy_sources(&self) -> &[String] {
        &self.policy_sources
    }

    /// Serializable view used by report formatters.
    pub fn report(&self) -> PolicyReport {
        PolicyReport {
            effective_thresholds: EffectiveThresholds::from(&self.values),
            effective_policy: EffectivePolicy {
                sources: self.policy_sources.clone(),
            },
            scope: self.scope.clone(),
            config_path: self.config_path.as_ref().map(|p| p.as_str().to_string()),
        }
    }
}

/// Policy section embedded in emitted reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyReport {
    pub effective_thresholds: EffectiveThresholds,
    pub effective_policy: EffectivePolicy,
    pub scope: PathScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveThresholds {
    pub fail_on_increase_percent: i64,
    pub low_confidence_warning_percent: i64,
    pub min_usage_percent_for_recommendations: i64,
    pub removal_candidate_weight_usage: f64,
    pub removal_candidate_weight_impact: f64,
    pub removal_candidate_weight_confidence: f64,
    pub lockfile_drift_policy: LockfileDriftPolicy,
}

impl From<&Values> for EffectiveThresholds {
    fn from(values: &Values) -> Self {
        Self {
            fail_on_increase_percent: values.fail_on_increase_percent,
            low_confidence_warning_percent: values.low_confidence_warning_percent,
            min_usage_percent_for_recommendations: values.min_usage_percent_for_recommendations,
            removal_candidate_weight_usage: values.removal_candidate_weight_usage,
            removal_candidate_weight_impact: values.removal_candidate_weight_impact,
            removal_candidate_weight_confidence: values.removal_candidate_weight_confidence,
            lockfile_drift_policy: values.lockfile_drift_policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectivePolicy {
    pub sources: Vec<String>,
}

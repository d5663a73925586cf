//! Threshold overrides, resolved values and their validation
//!
//! [`Overrides`] is one layer of optional settings; every field tracks
//! whether it was explicitly set. [`Values`] is the fully defaulted result
//! of folding all layers onto [`Values::default`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How lockfile drift affects the run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockfileDriftPolicy {
    /// Drift is not checked
    Off,
    /// Drift is reported but does not fail the run
    #[default]
    Warn,
    /// Drift fails the run
    Fail,
}

impl FromStr for LockfileDriftPolicy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            _ => Err(Error::validation(
                "lockfile_drift_policy",
                format!("{s:?} is not one of off, warn, fail"),
            )),
        }
    }
}

impl fmt::Display for LockfileDriftPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// One layer of explicitly-set thresholds.
///
/// `None` means "not set in this layer", which is different from being set
/// to zero: a `Some(0)` in a higher layer still replaces the base value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Overrides {
    pub fail_on_increase_percent: Option<i64>,
    pub low_confidence_warning_percent: Option<i64>,
    pub min_usage_percent_for_recommendations: Option<i64>,
    pub removal_candidate_weight_usage: Option<f64>,
    pub removal_candidate_weight_impact: Option<f64>,
    pub removal_candidate_weight_confidence: Option<f64>,
    pub lockfile_drift_policy: Option<LockfileDriftPolicy>,
}

impl Overrides {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether any removal-candidate weight is set.
    pub fn has_weight(&self) -> bool {
        self.removal_candidate_weight_usage.is_some()
            || self.removal_candidate_weight_impact.is_some()
            || self.removal_candidate_weight_confidence.is_some()
    }

    /// Layer `higher` on top of this set: every field set in `higher`
    /// replaces the current one, unset fields leave it untouched.
    pub fn merge(&mut self, higher: &Overrides) {
        self.fail_on_increase_percent = higher
            .fail_on_increase_percent
            .or(self.fail_on_increase_percent);
        self.low_confidence_warning_percent = higher
            .low_confidence_warning_percent
            .or(self.low_confidence_warning_percent);
        self.min_usage_percent_for_recommendations = higher
            .min_usage_percent_for_recommendations
            .or(self.min_usage_percent_for_recommendations);
        self.removal_candidate_weight_usage = higher
            .removal_candidate_weight_usage
            .or(self.removal_candidate_weight_usage);
        self.removal_candidate_weight_impact = higher
            .removal_candidate_weight_impact
            .or(self.removal_candidate_weight_impact);
        self.removal_candidate_weight_confidence = higher
            .removal_candidate_weight_confidence
            .or(self.removal_candidate_weight_confidence);
        self.lockfile_drift_policy = higher.lockfile_drift_policy.or(self.lockfile_drift_policy);
    }

    /// Validate only the fields that are set.
    ///
    /// When any weight is set, the weights merged with the defaults must
    /// still contain a positive entry, so zeroing all three is rejected
    /// even though each zero is individually in range.
    pub fn validate(&self) -> Result<()> {
        if let Some(value) = self.fail_on_increase_percent {
            check_fail_on_increase(value)?;
        }
        if let Some(value) = self.low_confidence_warning_percent {
            check_percent("low_confidence_warning_percent", value)?;
        }
        if let Some(value) = self.min_usage_percent_for_recommendations {
            check_percent("min_usage_percent_for_recommendations", value)?;
        }
        if let Some(value) = self.removal_candidate_weight_usage {
            check_weight("removal_candidate_weight_usage", value)?;
        }
        if let Some(value) = self.removal_candidate_weight_impact {
            check_weight("removal_candidate_weight_impact", value)?;
        }
        if let Some(value) = self.removal_candidate_weight_confidence {
            check_weight("removal_candidate_weight_confidence", value)?;
        }
        if self.has_weight() {
            Values::default().apply(self).check_weight_total()?;
        }
        Ok(())
    }
}

/// Fully resolved thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Values {
    pub fail_on_increase_percent: i64,
    pub low_confidence_warning_percent: i64,
    pub min_usage_percent_for_recommendations: i64,
    pub removal_candidate_weight_usage: f64,
    pub removal_candidate_weight_impact: f64,
    pub removal_candidate_weight_confidence: f64,
    pub lockfile_drift_policy: LockfileDriftPolicy,
}

impl Default for Values {
    fn default() -> Self {
        Self {
            fail_on_increase_percent: 0,
            low_confidence_warning_percent: 40,
            min_usage_percent_for_recommendations: 40,
            removal_candidate_weight_usage: 0.50,
            removal_candidate_weight_impact: 0.30,
            removal_candidate_weight_confidence: 0.20,
            lockfile_drift_policy: LockfileDriftPolicy::Warn,
        }
    }
}

impl Values {
    /// Return a copy with every set field of `overrides` applied.
    pub fn apply(&self, overrides: &Overrides) -> Values {
        Values {
            fail_on_increase_percent: overrides
                .fail_on_increase_percent
                .unwrap_or(self.fail_on_increase_percent),
            low_confidence_warning_percent: overrides
                .low_confidence_warning_percent
                .unwrap_or(self.low_confidence_warning_percent),
            min_usage_percent_for_recommendations: overrides
                .min_usage_percent_for_recommendations
                .unwrap_or(self.min_usage_percent_for_recommendations),
            removal_candidate_weight_usage: overrides
                .removal_candidate_weight_usage
                .unwrap_or(self.removal_candidate_weight_usage),
            removal_candidate_weight_impact: overrides
                .removal_candidate_weight_impact
                .unwrap_or(self.removal_candidate_weight_impact),
            removal_candidate_weight_confidence: overrides
                .removal_candidate_weight_confidence
                .unwrap_or(self.removal_candidate_weight_confidence),
            lockfile_drift_policy: overrides
                .lockfile_drift_policy
                .unwrap_or(self.lockfile_drift_policy),
        }
    }

    /// Check every domain invariant of the resolved values.
    pub fn validate(&self) -> Result<()> {
        check_fail_on_increase(self.fail_on_increase_percent)?;
        check_percent(
            "low_confidence_warning_percent",
            self.low_confidence_warning_percent,
        )?;
        check_percent(
            "min_usage_percent_for_recommendations",
            self.min_usage_percent_for_recommendations,
        )?;
        check_weight(
            "removal_candidate_weight_usage",
            self.removal_candidate_weight_usage,
        )?;
        check_weight(
            "removal_candidate_weight_impact",
            self.removal_candidate_weight_impact,
        )?;
        check_weight(
            "removal_candidate_weight_confidence",
            self.removal_candidate_weight_confidence,
        )?;
        self.check_weight_total()
    }

    fn check_weight_total(&self) -> Result<()> {
        let weights = [
            self.removal_candidate_weight_usage,
            self.removal_candidate_weight_impact,
            self.removal_candidate_weight_confidence,
        ];
        if weights.iter().any(|w| *w > 0.0) {
            Ok(())
        } else {
            Err(Error::validation(
                "removal_candidate_weights",
                "at least one weight must be greater than 0",
            ))
        }
    }
}

fn check_fail_on_increase(value: i64) -> Result<()> {
    if value < 0 {
        return Err(Error::validation(
            "fail_on_increase_percent",
            format!("must be >= 0, got {value}"),
        ));
    }
    Ok(())
}

fn check_percent(field: &'static str, value: i64) -> Result<()> {
    if !(0..=100).contains(&value) {
        return Err(Error::validation(
            field,
            format!("must be between 0 and 100, got {value}"),
        ));
    }
    Ok(())
}

fn check_weight(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation(
            field,
            format!("must be a finite number, got {value}"),
        ));
    }
    if value < 0.0 {
        return Err(Error::validation(
            field,
            format!("must be >= 0, got {value}"),
        ));
    }
    Ok(())
}

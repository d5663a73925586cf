//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// lopper - resolve the effective dependency policy for a repository
#[derive(Parser, Debug)]
#[command(name = "lopper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Print the effective policy and where it came from
    ///
    /// Examples:
    ///   lopper resolve                         # Discover config in current directory
    ///   lopper resolve --repo ../service       # Resolve another repository
    ///   lopper resolve --fail-on-increase 5    # Override one threshold
    ///   lopper resolve --json                  # Machine-readable output
    Resolve {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Check that the policy resolves without printing it
    Validate {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

/// Flags shared by every command that resolves a policy
#[derive(Args, Debug, Clone, PartialEq)]
pub struct PolicyArgs {
    /// Repository root
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Config file to use instead of discovery, relative to the repository root
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum allowed dependency growth, in percent
    #[arg(long, allow_negative_numbers = true)]
    pub fail_on_increase: Option<i64>,

    /// Confidence below which findings are flagged, in percent
    #[arg(long, allow_negative_numbers = true)]
    pub low_confidence_warning: Option<i64>,

    /// Minimum usage before a dependency is recommended for removal, in percent
    #[arg(long, allow_negative_numbers = true)]
    pub min_usage_percent: Option<i64>,

    /// Removal-candidate weight for usage
    #[arg(long, allow_negative_numbers = true)]
    pub score_weight_usage: Option<f64>,

    /// Removal-candidate weight for impact
    #[arg(long, allow_negative_numbers = true)]
    pub score_weight_impact: Option<f64>,

    /// Removal-candidate weight for confidence
    #[arg(long, allow_negative_numbers = true)]
    pub score_weight_confidence: Option<f64>,

    /// Reaction to lockfile drift (off, warn or fail)
    #[arg(long)]
    pub lockfile_drift_policy: Option<String>,

    /// Timeout for each remote pack request, in seconds
    #[arg(long, env = "LOPPER_FETCH_TIMEOUT")]
    pub fetch_timeout: Option<u64>,
}

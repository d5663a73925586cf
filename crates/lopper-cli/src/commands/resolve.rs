//! Resolve and validate command implementations

use std::time::Duration;

use colored::Colorize;
use lopper_policy::{
    LockfileDriftPolicy, Overrides, PolicyLoader, ResolutionResult, ResolveOptions,
};

use crate::cli::PolicyArgs;
use crate::error::Result;

/// Run the resolve command
pub fn run_resolve(args: &PolicyArgs, json: bool) -> Result<()> {
    let result = resolve_policy(args)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.report())?);
    } else {
        print_table(&result);
    }
    Ok(())
}

/// Run the validate command
pub fn run_validate(args: &PolicyArgs) -> Result<()> {
    let result = resolve_policy(args)?;
    println!(
        "{} policy resolved from {} source(s)",
        "OK".green().bold(),
        result.policy_sources().len()
    );
    Ok(())
}

/// Resolve the repository policy and layer the command-line flags on top.
pub fn resolve_policy(args: &PolicyArgs) -> Result<ResolutionResult> {
    let mut options = ResolveOptions::default();
    if let Some(secs) = args.fetch_timeout {
        options = options.with_fetch_timeout(Duration::from_secs(secs));
    }

    let cli_overrides = overrides_from_args(args)?;
    tracing::debug!(repo = %args.repo.display(), "Resolving policy");

    let loader = PolicyLoader::new(options)?;
    let result = loader.load(&args.repo, args.config.as_deref())?;
    Ok(result.with_cli_overrides(&cli_overrides)?)
}

fn overrides_from_args(args: &PolicyArgs) -> Result<Overrides> {
    let lockfile_drift_policy = args
        .lockfile_drift_policy
        .as_deref()
        .map(str::parse::<LockfileDriftPolicy>)
        .transpose()?;

    Ok(Overrides {
        fail_on_increase_percent: args.fail_on_increase,
        low_confidence_warning_percent: args.low_confidence_warning,
        min_usage_percent_for_recommendations: args.min_usage_percent,
        removal_candidate_weight_usage: args.score_weight_usage,
        removal_candidate_weight_impact: args.score_weight_impact,
        removal_candidate_weight_confidence: args.score_weight_confidence,
        lockfile_drift_policy,
    })
}

fn print_table(result: &ResolutionResult) {
    let values = result.values();

    println!("{}", "Effective Policy".bold());
    println!();

    match result.config_path() {
        Some(path) => println!("{}:  {}", "Config".dimmed(), path),
        None => println!("{}:  {}", "Config".dimmed(), "none (defaults)".dimmed()),
    }
    println!();

    println!("{}:", "Thresholds".bold());
    let rows: [(&str, String); 7] = [
        ("fail_on_increase_percent", values.fail_on_increase_percent.to_string()),
        (
            "low_confidence_warning_percent",
            values.low_confidence_warning_percent.to_string(),
        ),
        (
            "min_usage_percent_for_recommendations",
            values.min_usage_percent_for_recommendations.to_string(),
        ),
        (
            "removal_candidate_weight_usage",
            values.removal_candidate_weight_usage.to_string(),
        ),
        (
            "removal_candidate_weight_impact",
            values.removal_candidate_weight_impact.to_string(),
        ),
        (
            "removal_candidate_weight_confidence",
            values.removal_candidate_weight_confidence.to_string(),
        ),
        ("lockfile_drift_policy", values.lockfile_drift_policy.to_string()),
    ];
    for (name, value) in rows {
        println!("  {:<40} {}", name, value.cyan());
    }
    println!();

    println!("{}:", "Scope".bold());
    let scope = result.scope();
    for (label, globs) in [("include", &scope.include), ("exclude", &scope.exclude)] {
        if globs.is_empty() {
            println!("  {}: {}", label, "(all)".dimmed());
        } else {
            println!("  {}: {}", label, globs.join(", "));
        }
    }
    println!();

    println!("{}:", "Sources".bold());
    for (i, source) in result.policy_sources().iter().enumerate() {
        println!("  {}. {}", i + 1, source);
    }
}

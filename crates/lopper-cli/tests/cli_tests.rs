//! Integration tests for the lopper CLI binary.
//!
//! These tests exercise the actual compiled binary using assert_cmd.

use assert_cmd::Command;
use lopper_test_utils::repo::TestRepo;
use predicates::prelude::*;

/// Get a Command for the lopper binary
fn lopper_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("lopper"))
}

fn resolve_json(repo: &TestRepo, extra: &[&str]) -> serde_json::Value {
    let output = lopper_cmd()
        .arg("resolve")
        .arg("--repo")
        .arg(repo.path())
        .arg("--json")
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_output() {
    lopper_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_resolve_help_lists_threshold_flags() {
    lopper_cmd()
        .args(["resolve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fail-on-increase"))
        .stdout(predicate::str::contains("--lockfile-drift-policy"));
}

// ============================================================================
// Resolve
// ============================================================================

#[test]
fn test_resolve_empty_repo_reports_defaults() {
    let repo = TestRepo::new();
    let json = resolve_json(&repo, &[]);

    assert_eq!(json["effectivePolicy"]["sources"], serde_json::json!(["defaults"]));
    assert_eq!(json["effectiveThresholds"]["failOnIncreasePercent"], 0);
    assert_eq!(json["effectiveThresholds"]["lockfileDriftPolicy"], "warn");
}

#[test]
fn test_resolve_flag_overrides_config() {
    let repo = TestRepo::new();
    repo.write(".lopper.yml", "thresholds:\n  low_confidence_warning_percent: 30\n");

    let json = resolve_json(&repo, &["--low-confidence-warning", "40"]);

    assert_eq!(json["effectiveThresholds"]["lowConfidenceWarningPercent"], 40);
    assert_eq!(json["effectivePolicy"]["sources"][0], "cli");
    assert_eq!(
        json["effectivePolicy"]["sources"][1],
        repo.source_id(".lopper.yml").as_str()
    );
    assert_eq!(json["configPath"], repo.source_id(".lopper.yml").as_str());
}

#[test]
fn test_resolve_table_output() {
    let repo = TestRepo::new();
    repo.write(".lopper.yml", "scope:\n  include: [\"src/**\"]\n");

    lopper_cmd()
        .arg("resolve")
        .arg("--repo")
        .arg(repo.path())
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Effective Policy"))
        .stdout(predicate::str::contains("fail_on_increase_percent"))
        .stdout(predicate::str::contains("src/**"))
        .stdout(predicate::str::contains("defaults"));
}

#[test]
fn test_resolve_with_explicit_config() {
    let repo = TestRepo::new();
    repo.write("policies/strict.yaml", "lockfile_drift_policy: fail\n");

    let json = resolve_json(&repo, &["--config", "policies/strict.yaml"]);
    assert_eq!(json["effectiveThresholds"]["lockfileDriftPolicy"], "fail");
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_invalid_flag_value_fails() {
    let repo = TestRepo::new();
    lopper_cmd()
        .arg("resolve")
        .arg("--repo")
        .arg(repo.path())
        .args(["--min-usage-percent", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("min_usage_percent_for_recommendations"));
}

#[test]
fn test_unknown_drift_policy_fails() {
    let repo = TestRepo::new();
    lopper_cmd()
        .arg("validate")
        .arg("--repo")
        .arg(repo.path())
        .args(["--lockfile-drift-policy", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lockfile_drift_policy"));
}

#[test]
fn test_cycle_fails_resolution() {
    let repo = TestRepo::new();
    repo.write(".lopper.yml", "policy:\n  packs: [a.yml]\n");
    repo.write("a.yml", "policy:\n  packs: [.lopper.yml]\n");

    lopper_cmd()
        .arg("resolve")
        .arg("--repo")
        .arg(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("a.yml"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let repo = TestRepo::new();
    lopper_cmd()
        .arg("resolve")
        .arg("--repo")
        .arg(repo.path())
        .args(["--config", "nope.yml"])
        .assert()
        .failure();
}

// ============================================================================
// Validate
// ============================================================================

#[test]
fn test_validate_success_does_not_print_policy() {
    let repo = TestRepo::new();
    repo.write(".lopper.yml", "fail_on_increase_percent: 3\n");

    lopper_cmd()
        .arg("validate")
        .arg("--repo")
        .arg(repo.path())
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("2 source(s)"))
        .stdout(predicate::str::contains("fail_on_increase_percent").not());
}

#[test]
fn test_validate_reports_duplicate_field() {
    let repo = TestRepo::new();
    repo.write(
        ".lopper.yml",
        "fail_on_increase_percent: 1\nthresholds:\n  fail_on_increase_percent: 2\n",
    );

    lopper_cmd()
        .arg("validate")
        .arg("--repo")
        .arg(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("defined more than once"));
}

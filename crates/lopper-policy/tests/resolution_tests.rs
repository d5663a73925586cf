//! End-to-end tests for local policy resolution

use std::path::Path;

use lopper_policy::{
    ErrorKind, LockfileDriftPolicy, Overrides, PolicyLoader, ResolutionResult, ResolveOptions,
    Values,
};
use lopper_test_utils::repo::TestRepo;
use pretty_assertions::assert_eq;

fn load(repo: &TestRepo, explicit: Option<&str>) -> lopper_policy::Result<ResolutionResult> {
    let loader = PolicyLoader::new(ResolveOptions::default())?;
    loader.load(repo.path(), explicit.map(Path::new))
}

mod discovery {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_repo_resolves_to_defaults() {
        let repo = TestRepo::new();
        let result = load(&repo, None).unwrap();

        assert_eq!(*result.values(), Values::default());
        assert_eq!(result.policy_sources(), ["defaults"]);
        assert!(result.config_path().is_none());
        assert!(result.overrides().is_empty());
    }

    #[test]
    fn single_file_lists_absolute_path_then_defaults() {
        let repo = TestRepo::new();
        repo.write(".lopper.yml", "thresholds:\n  fail_on_increase_percent: 4\n");

        let result = load(&repo, None).unwrap();

        assert_eq!(result.values().fail_on_increase_percent, 4);
        assert_eq!(
            result.policy_sources(),
            [repo.source_id(".lopper.yml"), "defaults".to_string()]
        );
        assert_eq!(
            result.config_path().map(|p| p.as_str().to_string()),
            Some(repo.source_id(".lopper.yml"))
        );
    }

    #[test]
    fn yaml_wins_over_json_when_both_exist() {
        let repo = TestRepo::new();
        repo.write(".lopper.yaml", "thresholds:\n  fail_on_increase_percent: 1\n");
        repo.write("lopper.json", r#"{"thresholds": {"fail_on_increase_percent": 2}}"#);

        let result = load(&repo, None).unwrap();

        assert_eq!(result.values().fail_on_increase_percent, 1);
        assert_eq!(result.policy_sources()[0], repo.source_id(".lopper.yaml"));
    }

    #[test]
    fn json_config_is_discovered() {
        let repo = TestRepo::new();
        repo.write(
            "lopper.json",
            r#"{"thresholds": {"lockfile_drift_policy": "off"}, "scope": {"exclude": ["dist/**"]}}"#,
        );

        let result = load(&repo, None).unwrap();

        assert_eq!(result.values().lockfile_drift_policy, LockfileDriftPolicy::Off);
        assert_eq!(result.scope().exclude, vec!["dist/**"]);
    }

    #[test]
    fn explicit_missing_config_fails() {
        let repo = TestRepo::new();
        let err = load(&repo, Some("nope.yml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigNotFound);
    }
}

mod precedence {
    use super::*;
    use pretty_assertions::assert_eq;

    fn packs_repo(document_extra: &str) -> TestRepo {
        let repo = TestRepo::new();
        repo.write("packs/p1.yml", "thresholds:\n  low_confidence_warning_percent: 10\n");
        repo.write("packs/p2.yml", "thresholds:\n  low_confidence_warning_percent: 20\n");
        repo.write(
            ".lopper.yml",
            format!("policy:\n  packs: [packs/p1.yml, packs/p2.yml]\n{document_extra}"),
        );
        repo
    }

    #[test]
    fn later_pack_overrides_earlier_pack() {
        let repo = packs_repo("");
        let result = load(&repo, None).unwrap();

        assert_eq!(result.values().low_confidence_warning_percent, 20);
        assert_eq!(
            result.policy_sources(),
            [
                repo.source_id(".lopper.yml"),
                repo.source_id("packs/p2.yml"),
                repo.source_id("packs/p1.yml"),
                "defaults".to_string(),
            ]
        );
    }

    #[test]
    fn document_overrides_its_packs() {
        let repo = packs_repo("thresholds:\n  low_confidence_warning_percent: 30\n");
        let result = load(&repo, None).unwrap();
        assert_eq!(result.values().low_confidence_warning_percent, 30);
    }

    #[test]
    fn cli_overrides_everything() {
        let repo = packs_repo("thresholds:\n  low_confidence_warning_percent: 30\n");
        let cli = Overrides {
            low_confidence_warning_percent: Some(40),
            ..Overrides::default()
        };
        let result = load(&repo, None).unwrap().with_cli_overrides(&cli).unwrap();

        assert_eq!(result.values().low_confidence_warning_percent, 40);
        assert_eq!(result.policy_sources()[0], "cli");
        assert_eq!(result.policy_sources().last().unwrap(), "defaults");
    }

    #[test]
    fn pack_fields_not_overridden_survive() {
        let repo = TestRepo::new();
        repo.write(
            "base.yml",
            "thresholds:\n  min_usage_percent_for_recommendations: 70\n  lockfile_drift_policy: fail\n",
        );
        repo.write(
            ".lopper.yml",
            "policy:\n  packs: [base.yml]\nmin_usage_percent_for_recommendations: 65\n",
        );

        let result = load(&repo, None).unwrap();

        assert_eq!(result.values().min_usage_percent_for_recommendations, 65);
        assert_eq!(result.values().lockfile_drift_policy, LockfileDriftPolicy::Fail);
        assert_eq!(result.overrides().fail_on_increase_percent, None);
    }

    #[test]
    fn scope_lists_replace_rather_than_union() {
        let repo = TestRepo::new();
        repo.write(
            "base.yml",
            "scope:\n  include: [\"src/**\", \"lib/**\"]\n  exclude: [\"vendor/**\"]\n",
        );
        repo.write(
            ".lopper.yml",
            "policy:\n  packs: [base.yml]\nscope:\n  include: [\"app/**\", \"app/**\"]\n",
        );

        let result = load(&repo, None).unwrap();

        assert_eq!(result.scope().include, vec!["app/**"]);
        assert_eq!(result.scope().exclude, vec!["vendor/**"]);
    }

    #[test]
    fn resolution_is_idempotent() {
        let repo = packs_repo("scope:\n  exclude: [\"target/**\"]\n");
        let first = load(&repo, None).unwrap();
        let second = load(&repo, None).unwrap();
        assert_eq!(first, second);
    }
}

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn two_document_cycle_names_both() {
        let repo = TestRepo::new();
        repo.write("a.yml", "policy:\n  packs: [b.yml]\n");
        repo.write("b.yml", "policy:\n  packs: [a.yml]\n");

        let err = load(&repo, Some("a.yml")).unwrap_err();
        let message = err.to_string();

        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert!(message.contains(&repo.source_id("a.yml")), "{message}");
        assert!(message.contains(&repo.source_id("b.yml")), "{message}");
    }

    #[test]
    fn duplicate_threshold_fails_to_parse() {
        let repo = TestRepo::new();
        repo.write(
            ".lopper.yml",
            "fail_on_increase_percent: 1\nthresholds:\n  fail_on_increase_percent: 2\n",
        );

        let err = load(&repo, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateField);
    }

    #[test]
    fn duplicate_in_imported_pack_fails_whole_resolution() {
        let repo = TestRepo::new();
        repo.write(
            "pack.json",
            r#"{"removal_candidate_weight_usage": 1, "thresholds": {"removal_candidate_weight_usage": 2}}"#,
        );
        repo.write(".lopper.yml", "policy:\n  packs: [pack.json]\n");

        let err = load(&repo, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateField);
    }

    #[test]
    fn out_of_range_values_fail() {
        for content in [
            "thresholds:\n  low_confidence_warning_percent: 101\n",
            "thresholds:\n  removal_candidate_weight_usage: -0.1\n",
            "thresholds:\n  fail_on_increase_percent: -1\n",
            "thresholds:\n  removal_candidate_weight_usage: 0\n  removal_candidate_weight_impact: 0\n  removal_candidate_weight_confidence: 0\n",
        ] {
            let repo = TestRepo::new();
            repo.write(".lopper.yml", content);
            let err = load(&repo, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{content}");
        }
    }

    #[test]
    fn zero_weights_spread_over_layers_fail_final_validation() {
        let repo = TestRepo::new();
        repo.write(
            "a.yml",
            "thresholds:\n  removal_candidate_weight_usage: 0\n  removal_candidate_weight_impact: 0\n",
        );
        repo.write(
            ".lopper.yml",
            "policy:\n  packs: [a.yml]\nthresholds:\n  removal_candidate_weight_confidence: 0\n",
        );

        let err = load(&repo, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn missing_pack_fails() {
        let repo = TestRepo::new();
        repo.write(".lopper.yml", "policy:\n  packs: [missing.yml]\n");

        let err = load(&repo, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigNotFound);
    }

    #[test]
    fn unknown_field_in_pack_fails() {
        let repo = TestRepo::new();
        repo.write("base.yml", "thresholds:\n  max_dependencies: 3\n");
        repo.write(".lopper.yml", "policy:\n  packs: [base.yml]\n");

        let err = load(&repo, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn unsupported_pack_scheme_is_parse_error() {
        let repo = TestRepo::new();
        repo.write(".lopper.yml", "policy:\n  packs: [\"ftp://example.com/base.yml\"]\n");

        let err = load(&repo, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn null_pack_document_contributes_nothing() {
        let repo = TestRepo::new();
        repo.write("empty.yml", "~\n");
        repo.write("empty.json", "null");
        repo.write(".lopper.yml", "policy:\n  packs: [empty.yml, empty.json]\n");

        let result = load(&repo, None).unwrap();
        assert_eq!(*result.values(), Values::default());
        assert_eq!(result.policy_sources().len(), 4);
    }
}

mod sandbox {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn relative_import_escaping_root_is_rejected() {
        let outer = TestRepo::new();
        outer.write("outside.yml", "thresholds:\n  fail_on_increase_percent: 9\n");
        outer.write("repo/.lopper.yml", "policy:\n  packs: [../outside.yml]\n");

        let loader = PolicyLoader::new(ResolveOptions::default()).unwrap();
        let err = loader.load(outer.path().join("repo"), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigRead);
    }

    #[test]
    fn explicit_out_of_root_config_may_import_siblings() {
        let outer = TestRepo::new();
        outer.mkdir("repo");
        outer.write("shared/base.yml", "thresholds:\n  fail_on_increase_percent: 9\n");
        outer.write("shared/policy.yml", "policy:\n  packs: [base.yml]\n");

        let loader = PolicyLoader::new(ResolveOptions::default()).unwrap();
        let result = loader
            .load(
                outer.path().join("repo"),
                Some(Path::new("../shared/policy.yml")),
            )
            .unwrap();

        assert_eq!(result.values().fail_on_increase_percent, 9);
        assert_eq!(
            result.policy_sources(),
            [
                outer.source_id("shared/policy.yml"),
                outer.source_id("shared/base.yml"),
                "defaults".to_string(),
            ]
        );
    }

    #[test]
    #[cfg(unix)]
    fn symlink_pointing_outside_root_is_rejected() {
        let outer = TestRepo::new();
        let secret = outer.write("secret.yml", "thresholds:\n  fail_on_increase_percent: 9\n");
        let repo_dir = outer.mkdir("repo");
        std::os::unix::fs::symlink(&secret, repo_dir.join("linked.yml")).unwrap();
        outer.write("repo/.lopper.yml", "policy:\n  packs: [linked.yml]\n");

        let loader = PolicyLoader::new(ResolveOptions::default()).unwrap();
        let err = loader.load(&repo_dir, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigRead);
    }
}

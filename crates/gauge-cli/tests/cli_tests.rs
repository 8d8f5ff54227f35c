//! CLI integration tests
//!
//! Runs the `gauge` binary end to end:
//! - Help and tier output
//! - Text and JSON reports
//! - gauge.toml discovery and flag precedence
//! - Error handling

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const QUICK: [&str; 8] = [
    "--iterations",
    "10",
    "--samples",
    "1",
    "--interval",
    "0",
    "--stress-budget",
    "0.01",
];

/// `gauge` running in an empty directory with a private HOME
fn gauge_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gauge").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("NO_COLOR", "1")
        .env_remove("GAUGE_JSON")
        .env_remove("GAUGE_LOG")
        .env_remove("GAUGE_FILTER")
        .env_remove("GAUGE_ITERATIONS")
        .env_remove("GAUGE_SAMPLES")
        .env_remove("GAUGE_SAMPLE_INTERVAL_SECS")
        .env_remove("GAUGE_STRESS_BUDGET_SECS")
        .env_remove("GAUGE_LEAK_TOLERANCE");
    cmd
}

fn run_json(dir: &TempDir, extra: &[&str]) -> serde_json::Value {
    let output = gauge_cmd(dir)
        .arg("run")
        .args(QUICK)
        .arg("--json")
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

mod help_messages {
    use super::*;

    #[test]
    fn test_main_help_lists_commands() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("list"))
            .stdout(predicate::str::contains("tiers"))
            .stdout(predicate::str::contains("ENVIRONMENT VARIABLES"));
    }

    #[test]
    fn test_tiers_prints_every_band() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .arg("tiers")
            .assert()
            .success()
            .stdout(predicate::str::contains(">= 95   Full feature coverage"))
            .stdout(predicate::str::contains(
                "else    Poor — basic functionality only",
            ));
    }
}

mod run_command {
    use super::*;

    #[test]
    fn test_text_report_sections() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .arg("run")
            .args(QUICK)
            .assert()
            .success()
            .stdout(predicate::str::contains("=== Gauge Compatibility Report ==="))
            .stdout(predicate::str::contains("[ Performance ]"))
            .stdout(predicate::str::contains("[ Memory ]"))
            .stdout(predicate::str::contains("[ Rating ]"))
            .stdout(predicate::str::contains("Full feature coverage"))
            .stderr(predicate::str::contains("survived cleanup").not());
    }

    #[test]
    fn test_json_report_scores() {
        let dir = TempDir::new().unwrap();
        let report = run_json(&dir, &[]);

        assert_eq!(report["weighted_score"], 102);
        assert_eq!(report["max_weighted_score"], 102);
        assert_eq!(report["percentage"], 100.0);
        assert_eq!(report["outcomes"].as_array().unwrap().len(), 17);
        // Baseline plus one configured sample
        assert_eq!(report["memory"].as_array().unwrap().len(), 2);
        assert_eq!(report["memory_unit"], "objects");
        assert!(report["started_at"].is_string());
    }

    #[test]
    fn test_filter_flag_limits_outcomes() {
        let dir = TempDir::new().unwrap();
        let report = run_json(&dir, &["--filter", "roundtrip"]);
        let names: Vec<&str> = report["outcomes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "part_property_roundtrip",
                "label_text_roundtrip",
                "color_roundtrip"
            ]
        );
    }

    #[test]
    fn test_filter_matching_nothing_is_poor() {
        let dir = TempDir::new().unwrap();
        let report = run_json(&dir, &["--filter", "no_such_test"]);
        assert_eq!(report["total"], 0);
        assert_eq!(report["percentage"], 0.0);
    }

    #[test]
    fn test_verbose_logs_go_to_stderr() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .args(["run", "-v", "--json", "--filter", "create_part"])
            .args(QUICK)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("{"))
            .stderr(predicate::str::contains("run finished"));
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_project_config_is_discovered() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("gauge.toml"),
            "[run]\nfilter = \"create_\"\n[weights]\ncreate_part = 20\n",
        )
        .unwrap();

        // Substring match: the three create_dispose tests come along
        let report = run_json(&dir, &[]);
        assert_eq!(report["outcomes"].as_array().unwrap().len(), 7);
        assert_eq!(report["max_weighted_score"], 58);
    }

    #[test]
    fn test_flag_overrides_config_filter() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gauge.toml"), "[run]\nfilter = \"create_\"\n").unwrap();

        let report = run_json(&dir, &["--filter", "reject_type_mismatch"]);
        assert_eq!(report["outcomes"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_env_overrides_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gauge.toml"), "[run]\nfilter = \"create_\"\n").unwrap();

        let output = gauge_cmd(&dir)
            .env("GAUGE_FILTER", "bench_")
            .arg("run")
            .args(QUICK)
            .arg("--json")
            .output()
            .unwrap();
        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["outcomes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_config_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gauge.toml"), "[weights]\ncreate_part = 0\n").unwrap();

        gauge_cmd(&dir)
            .arg("run")
            .args(QUICK)
            .assert()
            .failure()
            .stderr(predicate::str::contains("create_part"));
    }

    #[test]
    fn test_oversized_interval_in_config_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gauge.toml"), "[memory]\ninterval_secs = 1e30\n").unwrap();

        gauge_cmd(&dir)
            .arg("run")
            .args(QUICK)
            .assert()
            .failure()
            .stderr(predicate::str::contains("memory.interval_secs"));
    }

    #[test]
    fn test_oversized_env_budget_fails() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .env("GAUGE_STRESS_BUDGET_SECS", "1e300")
            .args(["run", "--iterations", "10", "--samples", "1", "--interval", "0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("stress_budget_secs"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .args(["run", "--config", "nowhere.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }
}

mod list_command {
    use super::*;

    #[test]
    fn test_list_shows_weights_and_critical_marker() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"create_part\s+10\s+critical").unwrap())
            .stdout(predicate::str::contains("17 tests"));
    }

    #[test]
    fn test_list_json() {
        let dir = TempDir::new().unwrap();
        let output = gauge_cmd(&dir)
            .args(["list", "--json", "--filter", "leak"])
            .output()
            .unwrap();
        let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        insta::assert_json_snapshot!(listing, @r###"
        {
          "tests": [
            {
              "critical": false,
              "name": "leak_create_dispose",
              "weight": 6
            }
          ],
          "total_weight": 6
        }
        "###);
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn test_unknown_probe_rejected() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .args(["run", "--probe", "gpu"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn test_oversized_stress_budget_rejected() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .args(["run", "--stress-budget", "1e30"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("too large"));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let dir = TempDir::new().unwrap();
        gauge_cmd(&dir)
            .args(["run", "--iterations", "0"])
            .assert()
            .failure();
    }
}

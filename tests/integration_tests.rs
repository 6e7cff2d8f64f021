//! Integration tests for the hreach CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get an hreach command isolated from the user's config
fn hreach(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hreach").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env_remove("HREACH_T_POOR")
        .env_remove("HREACH_T_CRITICAL")
        .env_remove("HREACH_ESCALATION")
        .env_remove("HREACH_UNITS")
        .env_remove("HREACH_VOLUME_MODEL")
        .env_remove("HREACH_FORMAT")
        .env_remove("HREACH_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Scenario dataset: object A has ratios [1, 3], B has [5, 20, 3], C has none
fn write_scenario(tmp: &TempDir) {
    fs::write(
        tmp.path().join("holes.csv"),
        "object_id,hole_id,length,radius,material\n\
         A,a1,1,1,steel\n\
         A,a2,3,1,steel\n\
         B,b1,5,1,alu\n\
         B,b2,20,1,alu\n\
         B,b3,3,1,alu\n",
    )
    .unwrap();
    fs::write(tmp.path().join("objects.csv"), "object_id,name\nA,bracket\nB,plate\nC,cover\n")
        .unwrap();
}

const SCENARIO_FLAGS: &[&str] = &["--t-poor", "2.29", "--t-critical", "10"];

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hole reachability analysis"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("classify"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hreach"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp).arg("drill").assert().failure();
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_config() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized hreach project"));

    assert!(tmp.path().join(".hreach/config.yaml").exists());
}

#[test]
fn test_init_twice_warns() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp).arg("init").assert().success();
    hreach(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    hreach(&tmp).args(["init", "--force"]).assert().success();
}

// ============================================================================
// Analyze Tests
// ============================================================================

#[test]
fn test_analyze_writes_annotated_tables() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);

    hreach(&tmp)
        .args(["analyze", "holes.csv", "--objects", "objects.csv"])
        .args(["-o", "out_holes.csv", "--objects-out", "out_objects.csv"])
        .args(SCENARIO_FLAGS)
        .assert()
        .success()
        .stdout(predicate::str::contains("# Hole Reachability Report"))
        .stderr(predicate::str::contains("Analyzed 5 hole(s) across 3 object(s)"));

    let holes = fs::read_to_string(tmp.path().join("out_holes.csv")).unwrap();
    let lines: Vec<&str> = holes.lines().collect();
    assert_eq!(
        lines[0],
        "hole_id,object_id,length,radius,units,material,ratio,volume_mm3,status,severity,object_has_warning,object_has_error"
    );
    assert!(lines[1].starts_with("a1,A,1,1,mm,steel,1,"));
    assert!(lines[1].ends_with(",reachable,normal,true,false"));
    assert!(lines[2].ends_with(",unreachable,poor,true,false"));
    assert!(lines[4].ends_with(",unreachable,critical,true,true"));

    let objects = fs::read_to_string(tmp.path().join("out_objects.csv")).unwrap();
    assert!(objects.contains("A,bracket,2,1,0,true,false"));
    assert!(objects.contains("B,plate,3,3,1,true,true"));
    assert!(objects.contains("C,cover,0,0,0,false,false"));
}

#[test]
fn test_analyze_default_output_paths() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);

    hreach(&tmp)
        .args(["-q", "analyze", "holes.csv"])
        .assert()
        .success();

    assert!(tmp.path().join("holes.holes.csv").exists());
    assert!(tmp.path().join("holes.objects.csv").exists());
}

#[test]
fn test_analyze_nested_keeps_every_input_column() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("parts.csv"),
        "uuid,created,units,holes\n\
         P1,2021-01-01,mm,\"[{\"\"length\"\": 30, \"\"radius\"\": 1}]\"\n\
         P2,2021-01-02,cm,[]\n",
    )
    .unwrap();

    hreach(&tmp)
        .args(["-q", "analyze", "parts.csv", "--nested"])
        .assert()
        .success();

    let objects = fs::read_to_string(tmp.path().join("parts.objects.csv")).unwrap();
    let lines: Vec<&str> = objects.lines().collect();
    assert_eq!(
        lines[0],
        "object_id,created,units,holes,hole_count,unreachable_count,critical_count,has_warning,has_error"
    );
    assert!(lines[1].starts_with("P1,2021-01-01,mm,"));
    assert!(lines[1].ends_with(",1,1,0,true,false"));
    assert_eq!(lines[2], "P2,2021-01-02,cm,[],0,0,0,false,false");

    let holes = fs::read_to_string(tmp.path().join("parts.holes.csv")).unwrap();
    assert!(holes.contains("P1#1,P1,30,1,mm,30,"));
}

#[test]
fn test_analyze_leaves_no_partial_output() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);

    hreach(&tmp)
        .args(["analyze", "holes.csv", "-o", "out_holes.csv"])
        .args(["--objects-out", "missing/dir/out_objects.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot create"));

    assert!(!tmp.path().join("out_holes.csv").exists());
}

#[test]
fn test_analyze_zero_radius_aborts_without_output() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("holes.csv"),
        "object_id,hole_id,length,radius\nA,ok,1,1\nA,bad,5,0\nB,neg,5,-1\n",
    )
    .unwrap();

    hreach(&tmp)
        .args(["analyze", "holes.csv", "-o", "out.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("data quality check failed"))
        .stderr(predicate::str::contains("bad"))
        .stderr(predicate::str::contains("neg"));

    assert!(!tmp.path().join("out.csv").exists());
}

#[test]
fn test_analyze_rejects_non_monotonic_thresholds() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);

    hreach(&tmp)
        .args(["analyze", "holes.csv", "--t-poor", "10", "--t-critical", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("t_poor < t_critical"));
}

#[test]
fn test_analyze_unknown_object_is_reported() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);
    fs::write(tmp.path().join("objects.csv"), "object_id\nA\n").unwrap();

    hreach(&tmp)
        .args(["analyze", "holes.csv", "--objects", "objects.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown object 'B'"));
}

#[test]
fn test_analyze_missing_input_fails() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp)
        .args(["analyze", "nope.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.csv"));
}

// ============================================================================
// Summary Tests
// ============================================================================

#[test]
fn test_summary_json() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);

    let output = hreach(&tmp)
        .args(["summary", "holes.csv", "--objects", "objects.csv", "-f", "json"])
        .args(SCENARIO_FLAGS)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let count = |key: &str| {
        value["counts"]
            .as_array()
            .unwrap()
            .iter()
            .find(|l| l["key"] == key)
            .map(|l| l["absolute"].as_u64().unwrap())
            .unwrap()
    };
    assert_eq!(count("total_objects"), 3);
    assert_eq!(count("objects_with_warning"), 2);
    assert_eq!(count("objects_with_error"), 1);
    assert_eq!(count("unreachable_holes"), 4);
    assert_eq!(count("critical_holes"), 1);
    assert_eq!(value["distributions"]["holes_per_object"]["count"], 3);
}

#[test]
fn test_summary_nested_layout() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("objects.csv"),
        "uuid,units,holes\n\
         P1,mm,\"[{\"\"length\"\": 30, \"\"radius\"\": 1}]\"\n\
         P2,cm,[]\n",
    )
    .unwrap();

    hreach(&tmp)
        .args(["summary", "objects.csv", "--nested", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("objects\ttotal_objects\tabsolute\t2"))
        .stdout(predicate::str::contains("holes\tpoor_holes\tabsolute\t1"));
}

#[test]
fn test_summary_respects_project_config() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);
    hreach(&tmp).arg("init").assert().success();
    fs::write(
        tmp.path().join(".hreach/config.yaml"),
        "t_poor: 2.29\nt_critical: 10\n",
    )
    .unwrap();

    hreach(&tmp)
        .args(["summary", "holes.csv", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("holes,unreachable_holes,absolute,4"));
}

#[test]
fn test_summary_env_overrides_config() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);

    hreach(&tmp)
        .env("HREACH_T_POOR", "4")
        .env("HREACH_T_CRITICAL", "10")
        .args(["summary", "holes.csv", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("holes,unreachable_holes,absolute,2"));
}

#[test]
fn test_malformed_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);
    fs::write(tmp.path().join("bad.yaml"), "t_pour: 5\n").unwrap();

    hreach(&tmp)
        .args(["--config", "bad.yaml", "summary", "holes.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("t_pour"));
}

// ============================================================================
// List Tests
// ============================================================================

#[test]
fn test_list_unreachable_ids() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);

    hreach(&tmp)
        .args(["-q", "list", "holes.csv", "--unreachable-only", "-f", "id"])
        .args(SCENARIO_FLAGS)
        .assert()
        .success()
        .stdout("a2\nb1\nb2\nb3\n");
}

#[test]
fn test_list_flagged_objects_csv() {
    let tmp = TempDir::new().unwrap();
    write_scenario(&tmp);

    hreach(&tmp)
        .args(["-q", "list", "holes.csv", "--by-object", "-f", "csv"])
        .args(SCENARIO_FLAGS)
        .assert()
        .success()
        .stdout(predicate::str::contains("A,2,1,0,yes,no"))
        .stdout(predicate::str::contains("B,3,3,1,yes,yes"));
}

// ============================================================================
// Classify / Template Tests
// ============================================================================

#[test]
fn test_classify_single_hole() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp)
        .args(["classify", "--length", "85", "--radius", "1", "-f", "id"])
        .assert()
        .success()
        .stdout("critical\n");

    hreach(&tmp)
        .args(["classify", "--length", "20", "--radius", "1", "-f", "id"])
        .assert()
        .success()
        .stdout("poor\n");
}

#[test]
fn test_classify_zero_radius_fails() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp)
        .args(["classify", "--length", "5", "--radius", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("radius is 0"));
}

#[test]
fn test_template_round_trips_through_analyze() {
    let tmp = TempDir::new().unwrap();
    let output = hreach(&tmp).args(["template", "flat"]).output().unwrap();
    assert!(output.status.success());
    fs::write(tmp.path().join("holes.csv"), &output.stdout).unwrap();

    hreach(&tmp)
        .args(["-q", "list", "holes.csv", "-f", "id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H1"));
}

// ============================================================================
// Config / Completions Tests
// ============================================================================

#[test]
fn test_config_set_and_show() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp).arg("init").assert().success();

    hreach(&tmp)
        .args(["config", "set", "t_poor", "15"])
        .assert()
        .success();
    hreach(&tmp)
        .args(["config", "show", "t_poor"])
        .assert()
        .success()
        .stdout("15\n");

    hreach(&tmp)
        .args(["config", "unset", "t_poor"])
        .assert()
        .success();
    hreach(&tmp)
        .args(["config", "show", "t_poor"])
        .assert()
        .failure();
}

#[test]
fn test_config_set_rejects_invalid_values() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp).arg("init").assert().success();

    hreach(&tmp)
        .args(["config", "set", "colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
    hreach(&tmp)
        .args(["config", "set", "t_critical", "5"])
        .assert()
        .failure();
}

#[test]
fn test_config_set_checks_merged_layers() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp).arg("init").assert().success();

    hreach(&tmp)
        .args(["config", "set", "-g", "t_critical", "200"])
        .assert()
        .success();
    assert!(tmp.path().join(".config/hreach/config.yaml").exists());

    // Valid only together with the global t_critical
    hreach(&tmp)
        .args(["config", "set", "t_poor", "100"])
        .assert()
        .success();

    // Invalid against the project t_poor
    hreach(&tmp)
        .args(["config", "set", "t_critical", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("t_poor < t_critical"));
}

#[test]
fn test_config_keys() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp)
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("escalation_threshold"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    hreach(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hreach"));
}

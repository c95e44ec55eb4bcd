//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Build command for the fabguard-cli binary.
fn fabguard_cli() -> Command {
    cargo_bin_cmd!("fabguard-cli")
}

/// Path to fabguard library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fabguard")
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_cli_help() {
    let mut cmd = fabguard_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("short-circuit"));
}

#[test]
fn test_cli_version() {
    let mut cmd = fabguard_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_clean_board() {
    let mut cmd = fabguard_cli();

    cmd.arg("check").arg(fixtures_dir().join("clean.kicad_pcb"));

    cmd.assert()
        .code(0)
        .stdout(predicate::str::contains("Rules: JLCPCB 4-layer"))
        .stdout(predicate::str::contains("[PASS] Trace Shorts"))
        .stdout(predicate::str::contains("[SKIP] Fill Artifact Sizes"))
        .stdout(predicate::str::contains("RESULT: PASS — 0 errors, 0 warnings"));
}

#[test]
fn test_cli_check_violations() {
    let mut cmd = fabguard_cli();

    cmd.arg("check").arg(fixtures_dir().join("violations.kicad_pcb"));

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("[FAIL (1 errors)] Trace Width"))
        .stdout(predicate::str::contains(
            "Trace width 0.08mm < 0.09mm at (40,50)->(60,50) on F.Cu",
        ))
        .stdout(predicate::str::contains("[WARN] Net Connectivity (2 warnings)"))
        .stdout(predicate::str::contains("RESULT: FAIL — 7 errors, 2 warnings"));
}

#[test]
fn test_cli_check_nonexistent_file() {
    let mut cmd = fabguard_cli();

    cmd.arg("check").arg("does_not_exist.kicad_pcb");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error: does_not_exist.kicad_pcb not found"));
}

#[test]
fn test_cli_check_default_path() {
    let dir = TempDir::new().unwrap();
    let mut cmd = fabguard_cli();

    cmd.current_dir(dir.path()).arg("check");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("hardware/kicad/board.kicad_pcb not found"));
}

#[test]
fn test_cli_check_malformed_file() {
    let mut cmd = fabguard_cli();

    cmd.arg("check").arg(fixtures_dir().join("malformed.kicad_pcb"));

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Parse error"))
        .stdout(predicate::str::contains("RESULT").not());
}

#[test]
fn test_cli_check_json_output() {
    let mut cmd = fabguard_cli();

    cmd.arg("check")
        .arg(fixtures_dir().join("violations.kicad_pcb"))
        .arg("--format")
        .arg("json");

    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["error_count"], 7);
    assert_eq!(json["warning_count"], 2);
    assert_eq!(json["passed"], false);
}

#[test]
fn test_cli_github_format() {
    let mut cmd = fabguard_cli();

    cmd.arg("check")
        .arg(fixtures_dir().join("violations.kicad_pcb"))
        .arg("--format")
        .arg("github");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("::error file="))
        .stdout(predicate::str::contains("::warning file="))
        .stdout(predicate::str::contains("title=Trace Shorts::Trace short on B.Cu"));
}

#[test]
fn test_cli_custom_rules() {
    let mut cmd = fabguard_cli();

    cmd.arg("check")
        .arg(fixtures_dir().join("clean.kicad_pcb"))
        .arg("--rules")
        .arg(fixtures_dir().join("tight_rules.json"));

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Rules: Tight prototype"))
        .stdout(predicate::str::contains("[FAIL (6 errors)] Trace Width"))
        .stdout(predicate::str::contains("... and 1 more"));
}

#[test]
fn test_cli_bad_rules_file() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("rules.json");
    std::fs::write(&rules, "{ not json").unwrap();

    let mut cmd = fabguard_cli();
    cmd.arg("check")
        .arg(fixtures_dir().join("clean.kicad_pcb"))
        .arg("--rules")
        .arg(&rules);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error: loading rules from"));
}

#[test]
fn test_cli_placements() {
    let mut cmd = fabguard_cli();

    cmd.arg("check")
        .arg(fixtures_dir().join("clean.kicad_pcb"))
        .arg("--placements")
        .arg(fixtures_dir().join("placements.json"));

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("U1 <-> C1: 2.0mm apart (min 3mm)"));
}

#[test]
fn test_cli_artifacts() {
    let gerbers = TempDir::new().unwrap();
    std::fs::write(gerbers.path().join("clean-In1_Cu.g1"), vec![b'X'; 8000]).unwrap();
    std::fs::write(gerbers.path().join("clean-In2_Cu.g2"), vec![b'X'; 8000]).unwrap();

    let mut cmd = fabguard_cli();
    cmd.arg("check")
        .arg(fixtures_dir().join("clean.kicad_pcb"))
        .arg("--artifacts")
        .arg(gerbers.path());

    cmd.assert()
        .code(0)
        .stdout(predicate::str::contains("[PASS] Fill Artifact Sizes"));
}

#[test]
fn test_cli_rules_command() {
    let mut cmd = fabguard_cli();

    cmd.arg("rules");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("trace_shorts"))
        .stdout(predicate::str::contains("net_connectivity (warning)"));
}

#[test]
fn test_cli_rules_preset() {
    let mut cmd = fabguard_cli();

    cmd.arg("rules").arg("--preset");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("preset should be JSON");
    assert_eq!(json["min_trace_width"], 0.09);
}

#[test]
fn test_cli_output_formats_are_different() {
    let path = fixtures_dir().join("violations.kicad_pcb");

    let human_output = fabguard_cli()
        .arg("check")
        .arg(&path)
        .arg("--format")
        .arg("human")
        .output()
        .unwrap();
    let json_output = fabguard_cli()
        .arg("check")
        .arg(&path)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();

    assert_ne!(
        human_output.stdout, json_output.stdout,
        "Different formats should produce different output"
    );
}

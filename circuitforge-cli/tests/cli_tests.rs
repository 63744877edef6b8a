//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Build command for the circuitforge binary (finds it in target/debug when run via cargo test).
fn circuitforge_cli() -> Command {
    let mut cmd = cargo_bin_cmd!("circuitforge");
    for var in [
        "CIRCUITFORGE_PROVIDER",
        "CIRCUITFORGE_API_URL",
        "CIRCUITFORGE_API_KEY",
        "CIRCUITFORGE_MODEL",
        "CIRCUITFORGE_TIMEOUT_SECS",
        "CIRCUITFORGE_RETRY_DELAY_MS",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Path to circuitforge library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("circuitforge")
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_cli_help() {
    let mut cmd = circuitforge_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("netlist"));
}

#[test]
fn test_cli_version() {
    let mut cmd = circuitforge_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_render_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("rc.svg");

    let mut cmd = circuitforge_cli();
    cmd.arg("render")
        .arg(fixtures_dir().join("rc_series.cir"))
        .arg("-o")
        .arg(&out);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Components"))
        .stdout(predicate::str::contains("R1"))
        .stdout(predicate::str::contains("Schematic written to"));

    let svg = std::fs::read_to_string(&out).unwrap();
    assert!(svg.starts_with("<?xml"));
    assert_eq!(svg.matches(r#"class="symbol""#).count(), 3);
    assert!(svg.contains("#ffffff"));
}

#[test]
fn test_cli_render_display_theme() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("rc.svg");

    let mut cmd = circuitforge_cli();
    cmd.arg("render")
        .arg(fixtures_dir().join("rc_series.cir"))
        .arg("-o")
        .arg(&out)
        .arg("--theme")
        .arg("display");
    cmd.assert().success();

    let svg = std::fs::read_to_string(&out).unwrap();
    assert!(svg.contains("#fafafa"));
    assert!(!svg.contains("#000000"));
}

#[test]
fn test_cli_render_to_stdout() {
    let mut cmd = circuitforge_cli();
    cmd.arg("render").arg(fixtures_dir().join("transistor.cir"));

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains(r#"data-ref="Q1""#))
        .stdout(predicate::str::contains(r#"data-ref="M1""#));
}

#[test]
fn test_cli_render_json_requires_output_file() {
    let mut cmd = circuitforge_cli();
    cmd.arg("render")
        .arg(fixtures_dir().join("rc_series.cir"))
        .arg("--format")
        .arg("json");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("<svg").not())
        .stderr(predicate::str::contains("--format json needs -o"));
}

#[test]
fn test_cli_render_json_report_with_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("rc.svg");

    let mut cmd = circuitforge_cli();
    cmd.arg("render")
        .arg(fixtures_dir().join("rc_series.cir"))
        .arg("-o")
        .arg(&out)
        .arg("--format")
        .arg("json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["svg_file"], out.display().to_string());
    assert_eq!(json["generation"]["components"].as_array().unwrap().len(), 3);
    assert!(std::fs::read_to_string(&out).unwrap().contains("<svg"));
}

#[test]
fn test_cli_render_unwritable_output_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("missing-dir").join("rc.svg");

    let mut cmd = circuitforge_cli();
    cmd.arg("render")
        .arg(fixtures_dir().join("rc_series.cir"))
        .arg("-o")
        .arg(&out);

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Components"))
        .stdout(predicate::str::contains("Schematic written to").not())
        .stderr(predicate::str::contains("failed to write"));
}

#[test]
fn test_cli_render_stdin_model_output() {
    let raw = std::fs::read_to_string(fixtures_dir().join("model_output.txt")).unwrap();

    let mut cmd = circuitforge_cli();
    cmd.arg("render").arg("-").write_stdin(raw);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#"data-ref="V1""#))
        .stdout(predicate::str::contains(r#"data-ref="C1""#));
}

#[test]
fn test_cli_check_clean_netlist() {
    let mut cmd = circuitforge_cli();
    cmd.arg("check").arg(fixtures_dir().join("rc_series.cir"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_cli_check_with_fail_on_critical() {
    let mut cmd = circuitforge_cli();
    cmd.arg("check")
        .arg(fixtures_dir().join("broken.cir"))
        .arg("--fail-on")
        .arg("critical");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("CRITICAL"));

    // Without a threshold the same file only reports.
    let mut cmd = circuitforge_cli();
    cmd.arg("check").arg(fixtures_dir().join("broken.cir"));
    cmd.assert().success();
}

#[test]
fn test_cli_check_json_output() {
    let mut cmd = circuitforge_cli();
    cmd.arg("check")
        .arg(fixtures_dir().join("broken.cir"))
        .arg("--format")
        .arg("json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rule_ids: Vec<&str> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["rule_id"].as_str())
        .collect();
    assert!(rule_ids.contains(&"power_source"));
    assert!(rule_ids.contains(&"duplicate_reference"));
    assert!(rule_ids.contains(&"unknown_component"));
    assert!(json["stats"]["critical"].as_u64().unwrap() >= 1);
}

#[test]
fn test_cli_check_rule_filter() {
    let mut cmd = circuitforge_cli();
    cmd.arg("check")
        .arg(fixtures_dir().join("broken.cir"))
        .arg("--format")
        .arg("json")
        .arg("--rules")
        .arg("duplicate_reference,incomplete_component");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("duplicate_reference"))
        .stdout(predicate::str::contains("incomplete_component"))
        .stdout(predicate::str::contains("power_source").not());
}

#[test]
fn test_cli_check_nonexistent_file() {
    let mut cmd = circuitforge_cli();

    cmd.arg("check").arg("does_not_exist.cir");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_generate_empty_prompt() {
    let mut cmd = circuitforge_cli();

    cmd.arg("generate").arg("   ");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Prompt is empty"));
}

#[test]
fn test_cli_generate_model_unavailable() {
    let mut cmd = circuitforge_cli();

    cmd.arg("generate")
        .arg("5V battery with 100 ohm resistor")
        .env("CIRCUITFORGE_API_URL", "http://127.0.0.1:1")
        .env("CIRCUITFORGE_TIMEOUT_SECS", "5")
        .env("CIRCUITFORGE_RETRY_DELAY_MS", "10");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Model unavailable"));
}

#[test]
fn test_cli_bad_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("forge.json");
    std::fs::write(&config, "{ provider: ").unwrap();

    let mut cmd = circuitforge_cli();
    cmd.arg("--config")
        .arg(&config)
        .arg("generate")
        .arg("a 1k resistor");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn test_cli_components_command() {
    let mut cmd = circuitforge_cli();

    cmd.arg("components");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Voltage Source"))
        .stdout(predicate::str::contains("MOSFET"))
        .stdout(predicate::str::contains("GND / 0"))
        .stdout(predicate::str::contains("2+"));
}

#[test]
fn test_cli_rules_command() {
    let mut cmd = circuitforge_cli();

    cmd.arg("rules");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ground_reference"))
        .stdout(predicate::str::contains("connectivity"));
}

#[test]
fn test_cli_output_formats_are_different() {
    let path = fixtures_dir().join("divider.cir");

    let mut cmd_human = circuitforge_cli();
    cmd_human.arg("check").arg(&path).arg("--format").arg("human");
    let human_output = cmd_human.output().unwrap();

    let mut cmd_json = circuitforge_cli();
    cmd_json.arg("check").arg(&path).arg("--format").arg("json");
    let json_output = cmd_json.output().unwrap();

    assert_ne!(
        human_output.stdout, json_output.stdout,
        "Different formats should produce different output"
    );
}

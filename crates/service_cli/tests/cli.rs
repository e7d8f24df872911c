//! End-to-end tests for the `scenario` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const MODEL: &str = r#"
organization_id = "acme"

[[parameters]]
name = "PARAM_BASELINE_OMZET"
value = 1000000.0

[[parameters]]
name = "PARAM_BASELINE_VOORRAAD"
value = 10000.0

[[variables]]
name = "INPUT_OMZET"
variable_type = "INPUT"
unit = "EUR"
display_order = 1

[[variables]]
name = "OUTPUT_OMZET_PERCENTAGE"
variable_type = "OUTPUT"
formula = "(INPUT_OMZET / PARAM_BASELINE_OMZET) * 100"
dependencies = ["INPUT_OMZET"]
unit = "%"
display_order = 2

[[variables]]
name = "OUTPUT_PALLETS"
variable_type = "OUTPUT"
formula = "PARAM_BASELINE_VOORRAAD * OUTPUT_OMZET_PERCENTAGE / 100"
dependencies = ["OUTPUT_OMZET_PERCENTAGE"]
display_order = 3

[[scenarios]]
id = "baseline"
name = "Baseline"
is_baseline = true

[[scenarios]]
id = "dip"
name = "Sales dip"

[[values]]
scenario_id = "baseline"
variable_name = "INPUT_OMZET"
value = 1000000.0

[[values]]
scenario_id = "dip"
variable_name = "INPUT_OMZET"
value = 945000.0
"#;

const CYCLIC_MODEL: &str = r#"
organization_id = "acme"

[[variables]]
name = "INPUT_X"
variable_type = "INPUT"

[[variables]]
name = "A"
variable_type = "OUTPUT"
formula = "B + INPUT_X"
dependencies = ["B", "INPUT_X"]

[[variables]]
name = "B"
variable_type = "OUTPUT"
formula = "A * 2"
dependencies = ["A"]

[[scenarios]]
id = "base"
name = "Base"
is_baseline = true

[[values]]
scenario_id = "base"
variable_name = "INPUT_X"
value = 1.0
"#;

fn write_model(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn scenario(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scenario"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("SCENARIO_LOG_LEVEL")
        .env_remove("SCENARIO_OUTPUT_FORMAT")
        .env_remove("SCENARIO_DECIMAL_PLACES")
        .env_remove("SCENARIO_CACHE_ENABLED")
        .env_remove("SCENARIO_PARALLEL_THRESHOLD")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn calculate_prints_table_with_deltas() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "model.toml", MODEL);

    let output = scenario(&["calculate", "--model", path_arg(&model), "--scenario", "dip"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Scenario dip"));
    assert!(text.contains("COMPLETED"));
    assert!(text.contains("OUTPUT_OMZET_PERCENTAGE"));
    assert!(text.contains("94.5"));
    assert!(text.contains("-5.5"));
}

#[test]
fn calculate_json_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "model.toml", MODEL);

    let output = scenario(&[
        "calculate",
        "--model",
        path_arg(&model),
        "--scenario",
        "Sales dip",
        "--format",
        "json",
        "--decimal-places",
        "2",
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let runs = json.as_array().unwrap();
    assert_eq!(runs.len(), 1);
    let pallets = &runs[0]["results"]["OUTPUT_PALLETS"];
    assert_eq!(pallets["value"].as_f64(), Some(9450.0));
    assert_eq!(pallets["delta"].as_f64(), Some(-550.0));
    assert_eq!(pallets["percent_change"].as_f64(), Some(-5.5));
}

#[test]
fn calculate_csv_has_one_row_per_output() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "model.toml", MODEL);

    let output = scenario(&[
        "calculate",
        "--model",
        path_arg(&model),
        "--scenario",
        "baseline",
        "--format",
        "csv",
    ]);
    assert!(output.status.success());

    let text = stdout(&output);
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("scenario,period,status,variable"));
    assert_eq!(lines.count(), 2);
}

#[test]
fn calculate_unknown_scenario_fails() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "model.toml", MODEL);

    let output = scenario(&["calculate", "--model", path_arg(&model), "--scenario", "nope"]);
    assert!(!output.status.success());
}

#[test]
fn calculate_failed_run_prints_result_then_fails() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "cyclic.toml", CYCLIC_MODEL);

    let output = scenario(&["calculate", "--model", path_arg(&model), "--scenario", "base"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("FAILED"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("CalculationFailed(1)"));
}

#[test]
fn missing_model_file_fails() {
    let output = scenario(&[
        "calculate",
        "--model",
        "/definitely/not/here.toml",
        "--scenario",
        "baseline",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("FileNotFound"));
}

#[test]
fn run_all_reports_every_scenario() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "model.toml", MODEL);

    let output = scenario(&["run-all", "--model", path_arg(&model), "--format", "json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["baseline"].as_str(), Some("baseline"));
    assert_eq!(json["summary"]["runs"].as_u64(), Some(2));
    assert_eq!(json["summary"]["completed"].as_u64(), Some(2));
}

#[test]
fn run_all_table_ends_with_summary() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "model.toml", MODEL);

    let output = scenario(&["run-all", "--model", path_arg(&model)]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.trim_end().lines().last().unwrap().starts_with("2 runs: 2 completed"));
}

#[test]
fn validate_accepts_clean_model() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "model.toml", MODEL);

    let output = scenario(&["validate", "--model", path_arg(&model)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No issues found"));
}

#[test]
fn validate_rejects_cycle() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "cyclic.toml", CYCLIC_MODEL);

    let output = scenario(&["validate", "--model", path_arg(&model)]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("Circular dependency"));
}

#[test]
fn order_lists_levels() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "model.toml", MODEL);

    let output = scenario(&["order", "--model", path_arg(&model)]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Level 0: INPUT_OMZET"));
    assert!(text.contains("Level 1: OUTPUT_OMZET_PERCENTAGE"));
    assert!(text.contains("Level 2: OUTPUT_PALLETS"));
}

#[test]
fn order_fails_on_cycle() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir, "cyclic.toml", CYCLIC_MODEL);

    let output = scenario(&["order", "--model", path_arg(&model)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("CircularDependency"));
}

#[test]
fn check_reflects_cli_overrides() {
    let output = scenario(&["check", "--decimal-places", "3", "--no-cache"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("decimal_places = 3"));
    assert!(text.contains("cache_enabled = false"));
}

#[test]
fn check_reads_config_file() {
    let dir = TempDir::new().unwrap();
    let config = write_model(
        &dir,
        "scenario.toml",
        "output_format = \"json\"\n\n[engine]\nparallel_threshold = 8\n",
    );

    let output = scenario(&["check", "--config", path_arg(&config)]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("output_format = \"json\""));
    assert!(text.contains("parallel_threshold = 8"));
}

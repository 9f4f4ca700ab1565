mod common;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

use common::{TestWorkspace, sales_csv};

const SALES: &str = "\
date,region,sales
2024-01-01,East,10
2024-01-01,West,20
2024-01-02,East,30
2024-01-02,West,25
2024-01-02,East,15
";

fn bin() -> Command {
    Command::cargo_bin("csv-insight").expect("binary exists")
}

#[test]
fn profile_emits_summary_json() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", SALES);
    bin()
        .args(["profile", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            contains("\"rows\": 5")
                .and(contains("\"cols\": 3"))
                .and(contains("\"date_range\": \"2024-01-01 to 2024-01-02\""))
                .and(contains("\"sales\""))
                .and(contains("\"region\"")),
        );
}

#[test]
fn profile_table_renders_numeric_and_categorical_sections() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", SALES);
    bin()
        .args(["profile", "-i", input.to_str().unwrap(), "--table"])
        .assert()
        .success()
        .stdout(
            contains("rows")
                .and(contains("mean"))
                .and(contains("East"))
                .and(contains("West")),
        );
}

#[test]
fn profile_writes_json_to_output_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", SALES);
    let output = workspace.path().join("summary.json");
    bin()
        .args([
            "profile",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();
    let written = std::fs::read_to_string(&output).expect("summary written");
    let parsed: serde_json::Value = serde_json::from_str(&written).expect("valid json");
    assert_eq!(parsed["rows"], 5);
    assert_eq!(parsed["trend_sorted"]["2024-01-02"], 3);
}

#[test]
fn profile_reads_stdin_with_dash_input() {
    bin()
        .args(["profile", "-i", "-"])
        .write_stdin(SALES)
        .assert()
        .success()
        .stdout(contains("\"rows\": 5"));
}

#[test]
fn profile_respects_row_limit() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", SALES);
    bin()
        .args(["profile", "-i", input.to_str().unwrap(), "--limit", "3"])
        .assert()
        .success()
        .stdout(contains("\"rows\": 3"));
}

#[test]
fn profile_supports_alternate_delimiters() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.txt", &SALES.replace(',', "|"));
    bin()
        .args([
            "profile",
            "-i",
            input.to_str().unwrap(),
            "--delimiter",
            "pipe",
        ])
        .assert()
        .success()
        .stdout(contains("\"rows\": 5"));
}

#[test]
fn profile_fails_on_missing_input() {
    bin()
        .args(["profile", "-i", "no_such_file.csv"])
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn profile_fails_on_empty_data() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("empty.csv", "a,b\n");
    bin()
        .args(["profile", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("no data rows"));
}

#[test]
fn chart_emits_trend_and_category_specs() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", SALES);
    let assert = bin()
        .args(["chart", "-i", input.to_str().unwrap()])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(parsed["trend"]["points"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["categories"]["column"], "region");
}

#[test]
fn chart_omits_trend_for_single_day_data() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("single.csv", &sales_csv(10, 1, &["East", "West"]));
    let assert = bin()
        .args(["chart", "-i", input.to_str().unwrap()])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert!(parsed["trend"].is_null());
    assert_eq!(parsed["categories"]["column"], "region");
}

#[test]
fn report_without_credential_uses_the_template() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", SALES);
    bin()
        .env_remove("CSV_INSIGHT_API_KEY")
        .args(["report", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            contains("## Dataset profile")
                .and(contains("**5 rows** across **3 columns**"))
                .and(contains("2024-01-01 to 2024-01-02")),
        );
}

#[test]
fn report_falls_back_when_hosted_call_fails() {
    // Unroutable base URL forces the single hosted attempt to fail; the
    // deterministic template must still produce a full report.
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.csv", SALES);
    bin()
        .args([
            "report",
            "-i",
            input.to_str().unwrap(),
            "--api-key",
            "sk-test",
            "--base-url",
            "http://127.0.0.1:9",
        ])
        .assert()
        .success()
        .stdout(contains("## Dataset profile"));
}

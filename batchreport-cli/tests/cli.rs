use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

const BATCH: &str = "33333333-3333-3333-3333-333333333333";
const REPORT_KEY: &str = "reports/batch_33333333-3333-3333-3333-333333333333.csv";

/// Command isolated from any config in the real cwd/home.
fn batchreport_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("batchreport"));
    cmd.current_dir(home)
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(home: &TempDir) -> PathBuf {
    let path = home.path().join("batchreport.yaml");
    let yaml = format!(
        "\
reports_bucket:
  url: file://{bucket}
  prefix: reports/
engine:
  state_dir: {state}
  task_queue: poststorage
  workflow_name: batch-poststorage
worker:
  max_concurrent_sessions: 2
",
        bucket = home.path().join("bucket").display(),
        state = home.path().join("state").display(),
    );
    fs::write(&path, yaml).expect("write config");
    path
}

fn write_request(home: &TempDir, file: &str, name: &str) -> PathBuf {
    write_batch_request(home, file, BATCH, name)
}

fn write_batch_request(home: &TempDir, file: &str, batch: &str, name: &str) -> PathBuf {
    let path = home.path().join(file);
    let body = serde_json::json!({
        "batch": { "uuid": batch, "sipsCount": 2 },
        "sips": [
            { "name": name, "aipId": "11111111-2222-3333-4444-555555555555" },
            { "name": "Pending SIP" }
        ]
    });
    fs::write(&path, body.to_string()).expect("write request");
    path
}

#[test]
fn run_writes_report_and_prints_result() {
    let home = TempDir::new().expect("home");
    let config = write_config(&home);
    let request = write_request(&home, "request.json", "Test SIP 1");

    let assert = batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&request)
        .args(["--run-id", "run-1"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let line: serde_json::Value = serde_json::from_str(stdout.trim()).expect("json line");
    assert_eq!(line["runId"], "run-1");
    assert_eq!(line["outcome"], "Success");
    assert_eq!(line["relativePath"], REPORT_KEY);

    let report = fs::read_to_string(home.path().join("bucket").join(REPORT_KEY)).expect("report");
    let mut lines = report.lines();
    assert_eq!(
        lines.next(),
        Some("title,alternativeIdentifiers,alternativeIdentifierLabels,radGeneralMaterialDesignation,culture,levelOfDescription,publicationStatus,accessRestriction")
    );
    assert!(lines
        .next()
        .expect("one data row")
        .starts_with("Test SIP 1,11111111-2222-3333-4444-555555555555,AIP UUID,Multiple media,"));
    assert_eq!(lines.next(), None, "pending SIP is skipped");

    assert!(home
        .path()
        .join("state/default/runs/run-1.json")
        .exists());
}

#[test]
fn report_show_prints_stored_csv() {
    let home = TempDir::new().expect("home");
    let config = write_config(&home);
    let request = write_request(&home, "request.json", "Shown SIP");

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&request)
        .assert()
        .success();

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["report", "show", BATCH])
        .assert()
        .success()
        .stdout(contains("title,alternativeIdentifiers").and(contains("Shown SIP,")));

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["report", "show", BATCH, "--table"])
        .assert()
        .success()
        .stdout(contains("Shown SIP").and(contains("1 row(s) in reports/batch_")));
}

#[test]
fn report_show_for_unknown_batch_fails() {
    let home = TempDir::new().expect("home");
    let config = write_config(&home);

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["report", "show", "44444444-4444-4444-4444-444444444444"])
        .assert()
        .failure()
        .stderr(contains("no report for batch 44444444-4444-4444-4444-444444444444"));
}

#[test]
fn invalid_request_fails_with_content_error() {
    let home = TempDir::new().expect("home");
    let config = write_config(&home);
    let request = write_request(&home, "bad.json", "");

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&request)
        .assert()
        .failure()
        .stdout(contains("\"outcome\":\"ContentError\"").and(contains("SIP 1: missing name")))
        .stderr(contains("1 of 1 run(s) failed"));

    assert!(!home.path().join("bucket").join(REPORT_KEY).exists());
}

#[test]
fn several_requests_each_get_a_line() {
    const FIRST: &str = "aaaaaaaa-0000-0000-0000-000000000001";
    const SECOND: &str = "bbbbbbbb-0000-0000-0000-000000000002";
    let home = TempDir::new().expect("home");
    let config = write_config(&home);
    let first = write_batch_request(&home, "first.json", FIRST, "First");
    let second = write_batch_request(&home, "second.json", SECOND, "Second");

    let assert = batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&first)
        .arg(&second)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["relativePath"], format!("reports/batch_{FIRST}.csv"));
    assert_eq!(lines[1]["relativePath"], format!("reports/batch_{SECOND}.csv"));

    for (batch, title) in [(FIRST, "First,"), (SECOND, "Second,")] {
        let report = fs::read_to_string(
            home.path()
                .join("bucket/reports")
                .join(format!("batch_{batch}.csv")),
        )
        .expect("report");
        assert_eq!(report.lines().count(), 2, "header plus one row");
        assert!(report.lines().nth(1).expect("row").starts_with(title));
    }
}

#[test]
fn same_batch_twice_leaves_one_complete_report() {
    let home = TempDir::new().expect("home");
    let config = write_config(&home);
    let first = write_request(&home, "first.json", "First");
    let second = write_request(&home, "second.json", "Second");

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&first)
        .arg(&second)
        .assert()
        .success();

    let report = fs::read_to_string(home.path().join("bucket").join(REPORT_KEY)).expect("report");
    let rows: Vec<&str> = report.lines().skip(1).collect();
    assert_eq!(rows.len(), 1, "one writer's report, whole: {report}");
    assert!(rows[0].starts_with("First,") || rows[0].starts_with("Second,"));
    assert!(report.ends_with("details.\n"));

    let leftovers: Vec<_> = fs::read_dir(home.path().join("bucket/reports"))
        .expect("reports dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty(), "staging files left: {leftovers:?}");
}

#[test]
fn run_id_needs_a_single_request() {
    let home = TempDir::new().expect("home");
    let config = write_config(&home);
    let first = write_request(&home, "first.json", "First");
    let second = write_request(&home, "second.json", "Second");

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&first)
        .arg(&second)
        .args(["--run-id", "run-1"])
        .assert()
        .failure()
        .stderr(contains("--run-id can only be used with a single request"));
}

#[test]
fn config_check_lists_every_violation() {
    let home = TempDir::new().expect("home");
    let config = home.path().join("empty.yaml");
    fs::write(&config, "worker:\n  max_concurrent_sessions: 0\n").expect("write");

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(
            contains("reports_bucket: missing required value")
                .and(contains("engine.task_queue: missing required value"))
                .and(contains("engine.workflow_name: missing required value"))
                .and(contains(
                    "worker.max_concurrent_sessions: 0 is less than the minimum value (1)",
                )),
        );
}

#[test]
fn config_check_lists_bad_env_with_file_violations() {
    let home = TempDir::new().expect("home");
    let config = home.path().join("empty.yaml");
    fs::write(&config, "engine:\n  workflow_name: batch-poststorage\n").expect("write");

    batchreport_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "check"])
        .env("BATCHREPORT_WORKER_MAX_CONCURRENT_SESSIONS", "abc")
        .assert()
        .failure()
        .stderr(
            contains("BATCHREPORT_WORKER_MAX_CONCURRENT_SESSIONS: invalid value \"abc\"")
                .and(contains("reports_bucket: missing required value"))
                .and(contains("engine.task_queue: missing required value")),
        );
}

#[test]
fn config_check_accepts_valid_file_and_env_overrides() {
    let home = TempDir::new().expect("home");
    write_config(&home);

    batchreport_cmd(home.path())
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(contains("configuration OK"));

    batchreport_cmd(home.path())
        .args(["config", "check", "--json"])
        .env("BATCHREPORT_ENGINE_TASK_QUEUE", "from-env")
        .assert()
        .success()
        .stdout(contains("\"task_queue\": \"from-env\""));
}

#[test]
fn missing_explicit_config_is_reported() {
    let home = TempDir::new().expect("home");

    batchreport_cmd(home.path())
        .args(["--config", "does-not-exist.yaml", "config", "check"])
        .assert()
        .failure()
        .stderr(contains("configuration file not found"));
}

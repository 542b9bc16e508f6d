use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use rstest::rstest;

#[test]
fn test_init_validate_and_show() {
    let dir = tempfile::tempdir().unwrap();

    // Init project
    cargo_bin_cmd!("tabset")
        .args(["init", dir.path().to_str().unwrap(), "--name", "demo"])
        .assert()
        .success();

    // Verify generated files exist
    assert!(dir.path().join("tabset.yaml").exists());
    assert!(dir.path().join("datasets/raw_events.yaml").exists());
    assert!(dir.path().join("datasets/daily_summary.yaml").exists());
    assert!(dir.path().join("data/events.ndjson").exists());

    let project = dir.path().to_str().unwrap();

    cargo_bin_cmd!("tabset")
        .args(["--config", project, "validate"])
        .assert()
        .success();

    cargo_bin_cmd!("tabset")
        .args(["--config", project, "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo (0.1.0)"))
        .stdout(predicate::str::contains("http://localhost:2457"))
        .stdout(predicate::str::contains("Datasets: 2"));

    cargo_bin_cmd!("tabset")
        .args(["--config", project, "dataset", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("localfile-input -> table-output"))
        .stdout(predicate::str::contains("table-input -> table-output"));

    let output = cargo_bin_cmd!("tabset")
        .args(["--config", project, "dataset", "show", "daily_summary"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["name"], "daily_summary");
    assert_eq!(payload["trigger_by"], "td://raw_events");
    assert_eq!(
        payload["input"]["table-input"]["uri"],
        serde_json::json!(["td://raw_events/events@HEAD"])
    );

    // Re-init is refused
    cargo_bin_cmd!("tabset")
        .args(["init", project])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already contains a tabset.yaml"));
}

#[test]
fn test_validate_reports_error_code() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("datasets")).unwrap();
    std::fs::write(dir.path().join("tabset.yaml"), "name: broken\n").unwrap();
    std::fs::write(
        dir.path().join("datasets/bad.yaml"),
        "name: bad\ntrigger_by: td://upstream/table\n",
    )
    .unwrap();

    cargo_bin_cmd!("tabset")
        .args(["--config", dir.path().to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FCE-004"));
}

#[test]
fn test_missing_dataset() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tabset.yaml"), "name: empty\n").unwrap();

    cargo_bin_cmd!("tabset")
        .args(["--config", dir.path().to_str().unwrap(), "dataset", "show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dataset 'nope' not found"));
}

#[test]
fn test_uri_parse() {
    let output = cargo_bin_cmd!("tabset")
        .args(["uri", "parse", "td:///sales/orders/clean@HEAD~1..HEAD"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let components: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(components["datastore"], "sales");
    assert_eq!(components["dataset"], "orders");
    assert_eq!(components["table"], "clean");
    assert_eq!(components["version"], "HEAD~1..HEAD");
    assert_eq!(components["version_kind"], "VersionRange");
}

#[rstest]
#[case("http://sales")]
#[case("td://a/b/c")]
fn test_uri_parse_rejects_malformed(#[case] uri: &str) {
    cargo_bin_cmd!("tabset")
        .args(["uri", "parse", uri])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UCE-013"));
}

#[rstest]
#[case("HEAD^", "Version: HEAD^")]
#[case("HEAD,HEAD~3", "VersionList: HEAD,HEAD~3")]
#[case("HEAD~2..HEAD", "VersionRange: HEAD~2..HEAD")]
fn test_uri_version(#[case] token: &str, #[case] expected: &str) {
    cargo_bin_cmd!("tabset")
        .args(["uri", "version", token])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
}

#[test]
fn test_uri_version_rejects_lowercase_hash() {
    cargo_bin_cmd!("tabset")
        .args(["uri", "version", "head"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UCE-009"));
}

#[test]
fn test_connector_show_canonicalizes() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("input.yaml");
    std::fs::write(
        &file,
        r#"
s3-input:
  uri: s3://bucket/exports/data.csv
  credentials:
    s3-access-key-credentials:
      aws_access_key_id: AKIAEXAMPLE
      aws_secret_access_key:
        env-secret:
          environment_variable_name: AWS_SECRET_ACCESS_KEY
"#,
    )
    .unwrap();

    let output = cargo_bin_cmd!("tabset")
        .args(["connector", "show", file.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let canonical: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let fields = &canonical["s3-input"];
    assert_eq!(fields["uri"], serde_json::json!(["s3://bucket/exports/data.csv"]));
    assert!(fields["format"]["csv-format"].is_object());
}

#[test]
fn test_connector_show_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("output.json");
    std::fs::write(&file, r#"{"table-output": {"table": "events"}}"#).unwrap();

    cargo_bin_cmd!("tabset")
        .args(["connector", "show", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"events\""));
}

#[test]
fn test_connector_show_rejects_bad_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.yaml");
    std::fs::write(
        &file,
        "mysql-input:\n  uri: postgres://db/shop\n  query: select 1\n",
    )
    .unwrap();

    cargo_bin_cmd!("tabset")
        .args(["connector", "show", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ICE-002"));
}

#[test]
fn test_explain() {
    cargo_bin_cmd!("tabset")
        .args(["explain", "uce-016"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UCE-016 (UriConfigurationError)"))
        .stdout(predicate::str::contains("without a 'dataset'"));

    cargo_bin_cmd!("tabset")
        .args(["explain", "XYZ-001"])
        .assert()
        .failure();
}

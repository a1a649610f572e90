//! Binary-level tests for `enroll-admin`.

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use fabric_ca_client::testutil::{MockCa, MOCK_CA_NAME, MOCK_MSP_ID};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "FABRIC_CA_URL",
    "FABRIC_CA_NAME",
    "FABRIC_MSP_ID",
    "FABRIC_ENROLLMENT_ID",
    "FABRIC_ENROLLMENT_SECRET",
    "FABRIC_WALLET",
    "FABRIC_ENROLL_CONFIG",
    "RUST_LOG",
];

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn wallet(&self) -> PathBuf {
        self.dir.path().join("wallet")
    }

    /// `enroll-admin <args> --config .. --wallet ..` with a clean environment
    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("enroll-admin").unwrap();
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.args(args)
            .arg("--config")
            .arg(self.config())
            .arg("--wallet")
            .arg(self.wallet())
            .arg("--no-color");
        cmd
    }

    fn records(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.wallet()) else {
            return Vec::new();
        };
        entries
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| Path::new(name).extension().is_some_and(|ext| ext == "id"))
            .collect()
    }
}

/// Run the binary off the async runtime so the mock CA keeps serving
async fn run(mut cmd: Command) -> Assert {
    tokio::task::spawn_blocking(move || cmd.assert()).await.unwrap()
}

fn enroll_args<'a>(ca_url: &'a str, secret: &'a str) -> Vec<&'a str> {
    vec![
        "enroll",
        "--ca-url",
        ca_url,
        "--ca-name",
        MOCK_CA_NAME,
        "--msp-id",
        MOCK_MSP_ID,
        "--secret",
        secret,
    ]
}

#[test]
fn list_on_empty_wallet() {
    let ws = Workspace::new();
    ws.command(&["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No identities"));
}

#[test]
fn show_unknown_label_fails() {
    let ws = Workspace::new();
    ws.command(&["show", "admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No identity labelled \"admin\""));
}

#[test]
fn missing_ca_settings_fail_with_guidance() {
    let ws = Workspace::new();
    ws.command(&["enroll", "--secret", "adminpw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--ca-url"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn enroll_is_idempotent_and_inspectable() {
    let ca = MockCa::start("admin", "adminpw").await;
    ca.mount_enroll(1).await;
    let uri = ca.uri();
    let ws = Workspace::new();

    run(ws.command(&enroll_args(&uri, "adminpw")))
        .await
        .success()
        .stdout(predicate::str::contains("Success:"));

    run(ws.command(&enroll_args(&uri, "adminpw")))
        .await
        .success()
        .stdout(predicate::str::contains("already exists"));

    assert_eq!(ws.records(), vec!["admin.id"]);

    let output = ws
        .command(&["show", "admin", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("PRIVATE KEY"));
    let shown: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shown["label"], "admin");
    assert_eq!(shown["msp_id"], MOCK_MSP_ID);
    assert_eq!(shown["type"], "X.509");
    assert_eq!(shown["certificate"]["common_name"], "admin");

    let output = ws.command(&["list", "--output", "json"]).output().unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed, serde_json::json!([{ "label": "admin", "msp_id": MOCK_MSP_ID }]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bare_invocation_reads_environment() {
    let ca = MockCa::start("admin", "adminpw").await;
    ca.mount_enroll(1).await;
    let ws = Workspace::new();

    let mut cmd = Command::cargo_bin("enroll-admin").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("FABRIC_ENROLL_CONFIG", ws.config())
        .env("FABRIC_WALLET", ws.wallet())
        .env("FABRIC_CA_URL", ca.uri())
        .env("FABRIC_CA_NAME", MOCK_CA_NAME)
        .env("FABRIC_ENROLLMENT_SECRET", "adminpw")
        .args(["--output", "json"]);

    let assert = run(cmd).await.success();
    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(report["status"], "enrolled");
    assert_eq!(report["label"], "admin");
    // No MSP id configured: the CA name stands in as issuer
    assert_eq!(report["msp_id"], MOCK_CA_NAME);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_secret_exits_non_zero_and_stores_nothing() {
    let ca = MockCa::start("admin", "adminpw").await;
    ca.mount_enroll(1).await;
    let ws = Workspace::new();

    run(ws.command(&enroll_args(&ca.uri(), "wrong")))
        .await
        .failure()
        .stderr(predicate::str::contains("Failed to enroll \"admin\""))
        .stderr(predicate::str::contains("new one"));

    assert!(ws.records().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn secret_only_needed_when_not_enrolled() {
    let ca = MockCa::start("admin", "adminpw").await;
    ca.mount_enroll(1).await;
    let uri = ca.uri();
    let ws = Workspace::new();
    let no_secret = ["enroll", "--ca-url", &uri, "--ca-name", MOCK_CA_NAME];

    run(ws.command(&no_secret))
        .await
        .failure()
        .stderr(predicate::str::contains("Enrollment secret required"));

    run(ws.command(&enroll_args(&uri, "adminpw"))).await.success();

    run(ws.command(&no_secret))
        .await
        .success()
        .stdout(predicate::str::contains("already exists"));
}

//! Integration tests for the `kioskly` CLI binary.
//!
//! Argument parsing, config handling and exit codes run without any device.
//! Device-bound commands run against a wiremock server via `--url`.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `kioskly` binary with env isolation.
///
/// Clears all `KIOSKLY_*` env vars and points the config file at `config`
/// so tests never touch the user's real configuration.
fn kioskly_cmd_with(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("kioskly");
    cmd.env("HOME", "/tmp/kioskly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/kioskly-cli-test-nonexistent")
        .env("KIOSKLY_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("KIOSKLY_DEVICE")
        .env_remove("KIOSKLY_URL")
        .env_remove("KIOSKLY_API_KEY")
        .env_remove("KIOSKLY_OUTPUT")
        .env_remove("KIOSKLY_INSECURE")
        .env_remove("RUST_LOG");
    cmd
}

fn kioskly_cmd() -> assert_cmd::Command {
    kioskly_cmd_with(Path::new("/tmp/kioskly-cli-test-nonexistent/config.toml"))
}

/// Run a command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

async fn device_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "battery": { "level": 87, "charging": true },
                "screen": { "on": true, "brightness": 60 },
                "webview": { "currentUrl": "http://dash.local" }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "uptime": 42 }
        })))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = kioskly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_flag() {
    kioskly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("kiosk")
            .and(predicate::str::contains("exec"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("screenshot")),
    );
}

#[test]
fn test_version_flag() {
    kioskly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kioskly"));
}

#[test]
fn test_completions_bash() {
    kioskly_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Command catalog ─────────────────────────────────────────────────

#[test]
fn test_commands_table_lists_registry() {
    kioskly_cmd().arg("commands").assert().success().stdout(
        predicate::str::contains("set_brightness")
            .and(predicate::str::contains("/api/remote/{command}"))
            .and(predicate::str::contains("value: 0..=100")),
    );
}

#[test]
fn test_commands_json_has_every_builtin() {
    let output = kioskly_cmd().args(["-o", "json", "commands"]).output().unwrap();
    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(21));
}

#[test]
fn test_output_default_comes_from_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "[defaults]\noutput = \"plain\"\n");
    kioskly_cmd_with(&config)
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("beep\n"));
}

// ── Device selection / config errors ────────────────────────────────

#[test]
fn test_no_device_is_config_error() {
    kioskly_cmd()
        .arg("status")
        .assert()
        .code(8)
        .stderr(predicate::str::contains("No device selected"));
}

#[test]
fn test_unknown_profile_lists_available() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "[devices.hall]\nurl = \"http://hall.local:2323\"\n");
    kioskly_cmd_with(&config)
        .args(["-d", "kitchen", "status"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("hall"));
}

#[test]
fn test_duplicate_device_urls_are_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "[devices.a]\nurl = \"http://hall.local:2323\"\n\n[devices.b]\nurl = \"http://hall.local:2323/\"\n",
    );
    kioskly_cmd_with(&config)
        .args(["config", "devices"])
        .assert()
        .code(8);
}

#[test]
fn test_malformed_parameter_is_usage_error() {
    kioskly_cmd()
        .args(["--url", "http://127.0.0.1:9", "exec", "set_volume", "-P", "value"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_command_makes_no_request() {
    kioskly_cmd()
        .args(["--url", "http://127.0.0.1:9", "exec", "self_destruct"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("self_destruct"));
}

#[test]
fn test_non_http_url_is_rejected() {
    kioskly_cmd()
        .args(["--url", "ftp://tablet.local", "check"])
        .assert()
        .code(2);
}

// ── Config subcommands ──────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    kioskly_cmd_with(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_show_masks_keys() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "[devices.hall]\nurl = \"http://hall.local:2323\"\napi_key = \"s3cret\"\n",
    );
    kioskly_cmd_with(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****").and(predicate::str::contains("s3cret").not()));
}

#[test]
fn test_config_add_without_check_then_list() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    kioskly_cmd_with(&config)
        .args(["config", "add", "hall", "--url", "http://hall.local:2323", "--no-check"])
        .assert()
        .success();

    kioskly_cmd_with(&config)
        .args(["-o", "plain", "config", "devices"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hall"));

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains("default_device = \"hall\""), "{saved}");
}

#[test]
fn test_config_add_rejects_duplicate_url() {
    let dir = TempDir::new().unwrap();
    let original = "[devices.hall]\nurl = \"http://hall.local:2323\"\n";
    let config = write_config(&dir, original);

    kioskly_cmd_with(&config)
        .args(["config", "add", "lobby", "--url", "http://hall.local:2323/", "--no-check"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("hall"));

    assert_eq!(std::fs::read_to_string(&config).unwrap(), original);
}

#[test]
fn test_config_add_rejects_existing_name() {
    let dir = TempDir::new().unwrap();
    let original = "[devices.hall]\nurl = \"http://hall.local:2323\"\n";
    let config = write_config(&dir, original);

    kioskly_cmd_with(&config)
        .args(["config", "add", "hall", "--url", "http://lobby.local:2323", "--no-check"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(std::fs::read_to_string(&config).unwrap(), original);
}

#[test]
fn test_config_add_duplicate_is_rejected_before_connecting() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "[devices.hall]\nurl = \"http://127.0.0.1:9\"\n");

    // Nothing listens on port 9, so reaching the network would exit 7.
    kioskly_cmd_with(&config)
        .args(["config", "add", "lobby", "--url", "http://127.0.0.1:9/", "--key", "k"])
        .assert()
        .code(8);
}

// ── Device-bound commands ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_reports_extracted_values() {
    let server = device_server().await;
    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "-o", "json", "status"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let values: Value = serde_json::from_slice(&output.stdout).unwrap();
    let find = |key: &str| {
        values
            .as_array()
            .unwrap()
            .iter()
            .find(|v| v["key"] == key)
            .cloned()
            .unwrap()
    };
    assert_eq!(find("battery_level")["value"], json!(87));
    assert_eq!(find("battery_level")["unit"], json!("%"));
    assert_eq!(find("battery_charging")["value"], json!(true));
    assert_eq!(find("wifi_connected")["value"], json!(false));
    assert_eq!(find("webview_url")["value"], json!("http://dash.local"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_raw_includes_health() {
    let server = device_server().await;
    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "-o", "json", "status", "--raw"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let raw: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(raw["data"]["uptime"], json!(42));
    assert_eq!(raw["data"]["screen"]["brightness"], json!(60));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_succeeds_against_healthy_device() {
    let server = device_server().await;
    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "check"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("reachable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_key_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "--api-key", "wrong", "check"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unhealthy_device_exits_with_communication_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "check"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exec_posts_coerced_payload() {
    let server = device_server().await;
    Mock::given(method("POST"))
        .and(path("/api/brightness"))
        .and(body_json(json!({ "value": 42 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "exec", "set_brightness", "-P", "value=42"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exec_out_of_range_sends_nothing() {
    let server = device_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "exec", "set_volume", "-P", "value=150"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exec_fails_when_first_refresh_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "exec", "reload"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_screenshot_writes_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/screenshot"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("shot.png");
    let mut cmd = kioskly_cmd();
    cmd.args(["--url", &server.uri(), "screenshot", "-f"]).arg(&file);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(std::fs::read(&file).unwrap(), [0x89, b'P', b'N', b'G']);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_add_checks_connection() {
    let server = device_server().await;
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    let mut cmd = kioskly_cmd_with(&config);
    cmd.args(["config", "add", "hall", "--url", &server.uri()]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(std::fs::read_to_string(&config).unwrap().contains(&server.uri()));
}

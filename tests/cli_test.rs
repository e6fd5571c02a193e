#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn diagchat() -> Command {
    let mut cmd = Command::cargo_bin("diagchat").unwrap();
    cmd.env_remove("DIAGCHAT_BASE_URL")
        .env_remove("DIAGCHAT_TIMEOUT_SECONDS")
        .env_remove("DIAGCHAT_GUARD_ENABLED")
        .env_remove("DIAGCHAT_VEHICLE_SEARCH_LIMIT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    diagchat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("vehicles"))
        .stdout(predicate::str::contains("providers"));
}

#[test]
fn test_version() {
    diagchat()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Zero timeout is rejected before any command runs
#[test]
fn test_invalid_config_timeout_zero() {
    let (_temp_dir, config_path) =
        common::temp_config_file("service:\n  base_url: http://localhost:8000/api\n  timeout_seconds: 0\n");

    diagchat()
        .arg("--config")
        .arg(config_path)
        .arg("vehicles")
        .arg("prius")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "timeout_seconds must be greater than 0",
        ));
}

#[test]
fn test_invalid_config_search_limit() {
    let (_temp_dir, config_path) =
        common::temp_config_file("chat:\n  vehicle_search_limit: 500\n");

    diagchat()
        .arg("--config")
        .arg(config_path)
        .arg("vehicles")
        .arg("prius")
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 1 and 50"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vehicles_json_output() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/vehicles/search"))
        .and(query_param("q", "prius"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::vehicle_results()))
        .expect(1)
        .mount(&server)
        .await;

    let (_temp_dir, config_path) = common::temp_config_file("chat:\n  vehicle_search_limit: 3\n");

    let output = diagchat()
        .arg("--config")
        .arg(config_path)
        .arg("vehicles")
        .arg("prius")
        .arg("--json")
        .arg("--base-url")
        .arg(format!("{}/api", server.uri()))
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["vehicle"]["id"], "prius-2021");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_providers_use_unconfigured_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::provider_listing()))
        .mount(&server)
        .await;

    let output = diagchat()
        .arg("providers")
        .arg("use")
        .arg("local")
        .arg("--base-url")
        .arg(format!("{}/api", server.uri()))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not configured"), "stderr: {}", stderr);
}

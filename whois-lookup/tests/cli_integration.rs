// whois-lookup/tests/cli_integration.rs

//! CLI tests covering the offline paths: argument handling, validation,
//! dry runs and the registry listing. Nothing here touches the network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A command isolated from the user's config files and WL_* variables.
fn whois_lookup(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("whois-lookup").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("WL_TIMEOUT")
        .env_remove("WL_AGGREGATOR")
        .env_remove("WL_API_KEY")
        .env_remove("WL_CONFIG")
        .env_remove("WL_JSON")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_flags() {
    let home = TempDir::new().unwrap();
    whois_lookup(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DOMAIN"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--no-aggregator"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--list-registries"));
}

#[test]
fn test_missing_domain_is_usage_error() {
    let home = TempDir::new().unwrap();
    whois_lookup(&home).assert().failure().code(2);
}

#[test]
fn test_invalid_domain_exits_2() {
    let home = TempDir::new().unwrap();
    whois_lookup(&home)
        .arg("not_a_domain")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid domain"));
}

#[test]
fn test_invalid_domain_json_body() {
    let home = TempDir::new().unwrap();
    let output = whois_lookup(&home)
        .args(["localhost", "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Invalid domain"));
    assert_eq!(body["domain"], "localhost");
    assert_eq!(body["attemptedSources"], serde_json::json!([]));
}

#[test]
fn test_dry_run_known_tld() {
    let home = TempDir::new().unwrap();
    whois_lookup(&home)
        .args(["https://Example.COM/about", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. verisign-com"))
        .stdout(predicate::str::contains("https://rdap.verisign.com/com/v1/domain/example.com"))
        .stdout(predicate::str::contains("2. rdap-org"));
}

#[test]
fn test_dry_run_json_with_configured_aggregator() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("custom.toml");
    fs::write(
        &config_path,
        r#"
[aggregator]
id = "whois-api"
endpoint = "https://api.example.net/whois/{domain}"

[fallback]
default_registry = "https://rdap.fallback.example/domain/"
"#,
    )
    .unwrap();

    let output = whois_lookup(&home)
        .args(["example.museum", "--dry-run", "--json", "--config"])
        .arg(&config_path)
        .env("WL_API_KEY", "secret")
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = plan
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["rdap-org", "whois-api", "rdap.fallback.example"]);
    assert_eq!(plan[1]["requiresApiKey"], true);
    assert_eq!(plan[1]["url"], "https://api.example.net/whois/example.museum");

    // --no-aggregator drops it again
    let output = whois_lookup(&home)
        .args(["example.museum", "--dry-run", "--json", "--no-aggregator", "--config"])
        .arg(&config_path)
        .env("WL_API_KEY", "secret")
        .output()
        .unwrap();
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan.as_array().unwrap().len(), 2);

    // without a key the aggregator could never be queried, so it is not planned
    let output = whois_lookup(&home)
        .args(["example.museum", "--dry-run", "--json", "--config"])
        .arg(&config_path)
        .output()
        .unwrap();
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = plan
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["rdap-org", "rdap.fallback.example"]);
}

#[test]
fn test_local_config_file_is_discovered() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("whois-lookup.toml"),
        "[registries]\nmuseum = \"https://rdap.museum.example/domain/\"\n",
    )
    .unwrap();

    whois_lookup(&home)
        .args(["example.museum", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. rdap.museum.example"));
}

#[test]
fn test_invalid_config_file_fails() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("bad.toml");
    fs::write(&config_path, "[defaults]\ntimeout = \"0s\"\n").unwrap();

    whois_lookup(&home)
        .args(["example.com", "--dry-run", "--config"])
        .arg(&config_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_invalid_timeout_flag_fails() {
    let home = TempDir::new().unwrap();
    whois_lookup(&home)
        .args(["example.com", "--dry-run", "--timeout", "soon"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid timeout"));
}

#[test]
fn test_list_registries() {
    let home = TempDir::new().unwrap();
    whois_lookup(&home)
        .arg("--list-registries")
        .assert()
        .success()
        .stdout(predicate::str::contains(".com"))
        .stdout(predicate::str::contains(".vn"))
        .stdout(predicate::str::contains("https://rdap.nominet.uk/domain/"));
}

#[test]
fn test_env_json_flag() {
    let home = TempDir::new().unwrap();
    let output = whois_lookup(&home)
        .args(["example.dev", "--dry-run"])
        .env("WL_JSON", "true")
        .output()
        .unwrap();
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan[0]["id"], "google-registry-dev");
    assert_eq!(plan[1]["id"], "google-apis-dev");
    assert_eq!(plan[2]["id"], "rdap-org");
}

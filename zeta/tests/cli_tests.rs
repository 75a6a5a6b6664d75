//! Binary-level checks for startup, configuration and argument handling.
//!
//! None of these reach the network: each run either stops before scanning
//! or has every source disabled through its config file.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn zeta() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("zeta");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_no_search_term_prints_hint() {
    let tmp = TempDir::new().unwrap();

    zeta()
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No search term provided. Use -s or --search to specify a search term.",
        ));
}

#[test]
fn test_quiet_suppresses_banner() {
    let tmp = TempDir::new().unwrap();

    zeta()
        .current_dir(tmp.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("Subdomain Discovery Tool").not());
}

#[test]
fn test_init_writes_default_config() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("conf").join("zeta.toml");

    zeta()
        .arg("--init")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created default configuration file"));

    let written = fs::read_to_string(&config_path).unwrap();
    assert!(written.contains("[cert_log]"));
    assert!(written.contains("https://crt.sh/"));
    assert!(written.contains("[web_scan]"));
}

#[test]
fn test_invalid_domain_exits_with_error() {
    zeta()
        .args(["--search", "https://example.com/path"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid arguments"));
}

#[test]
fn test_both_sources_disabled_is_rejected() {
    zeta()
        .args(["-s", "example.com", "--disable-cert-log", "--disable-web-scan"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_missing_explicit_config_fails() {
    let tmp = TempDir::new().unwrap();

    zeta()
        .args(["-s", "example.com", "--config"])
        .arg(tmp.path().join("missing.toml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_malformed_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("zeta.toml");
    fs::write(&config_path, "[http\nuser_agent = ").unwrap();

    zeta()
        .args(["-s", "example.com", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_all_sources_disabled_in_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("zeta.toml");
    let config = include_str!("../config/zeta.toml")
        .replacen("enabled = true", "enabled = false", 2);
    fs::write(&config_path, config).unwrap();

    zeta()
        .args(["-s", "example.com", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No discovery sources enabled"));
}

//! Integration tests for the wgmgr CLI

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use test_case::test_case;

fn wgmgr(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wgmgr").expect("binary built");
    cmd.env_remove("WGMGR_CONFIG").arg("-c").arg(config);
    cmd
}

fn new_config(config: &Path) {
    wgmgr(config).args(["config", "new"]).assert().success();
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("wgmgr")
        .expect("binary built")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("peer"));
}

#[test]
fn test_config_new_creates_file() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("wgmgr.conf");

    wgmgr(&config)
        .args(["config", "new"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration"));

    let snapshot: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config).expect("read")).expect("json");
    assert_eq!(snapshot["ipv4_network"], "10.0.0.0/24");
    assert_eq!(snapshot["ipv6_network"], "fd00:641:c767:bc00::/64");
    assert_eq!(snapshot["default_port"], 51820);
}

#[test]
fn test_config_new_refuses_overwrite() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("wgmgr.conf");
    new_config(&config);

    wgmgr(&config)
        .args(["config", "new"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    wgmgr(&config)
        .args(["config", "new", "-f", "-6", ""])
        .assert()
        .success();
    let snapshot: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config).expect("read")).expect("json");
    assert!(snapshot["ipv6_network"].is_null());
}

#[test_case("10.0.0.0/32" ; "single host")]
#[test_case("10.0.0.1/24" ; "host bits")]
#[test_case("not-a-network" ; "garbage")]
fn test_config_new_invalid_subnet(subnet: &str) {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("wgmgr.conf");

    wgmgr(&config)
        .args(["config", "new", "-4", subnet])
        .assert()
        .failure();
    assert!(!config.exists());
}

#[test_case("-1" ; "negative")]
#[test_case("0" ; "zero")]
#[test_case("90000" ; "too large")]
fn test_config_new_invalid_port(port: &str) {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("wgmgr.conf");

    wgmgr(&config)
        .args(["config", "new", "-p", port])
        .assert()
        .failure();
    assert!(!config.exists());
}

#[test]
fn test_missing_config_fails() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("absent.conf");

    wgmgr(&config)
        .args(["peer", "add", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_peer_lifecycle() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("wgmgr.conf");
    new_config(&config);

    wgmgr(&config)
        .args(["peer", "add", "alpha"])
        .assert()
        .success()
        .stderr(predicate::str::contains("note: alpha: assigned IPv4 address 10.0.0.1"));
    wgmgr(&config)
        .args(["peer", "add", "beta", "-p", "4000"])
        .assert()
        .success();
    wgmgr(&config)
        .args(["peer", "add", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("peer already exists: alpha"));

    wgmgr(&config)
        .args(["config", "set", "default-port", "4242"])
        .assert()
        .success()
        .stderr(predicate::str::contains("note: alpha: port set to 4242"));

    let output = wgmgr(&config)
        .args(["--format", "json", "peer", "list"])
        .output()
        .expect("run peer list");
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(list["peers"][0]["name"], "alpha");
    assert_eq!(list["peers"][0]["port"]["value"], "4242");
    assert_eq!(list["peers"][1]["port"]["value"], "4000");
    assert_eq!(list["peers"][1]["port"]["auto"], false);
    assert!(list["peers"][0].get("private_key").is_none());

    wgmgr(&config)
        .args(["peer", "remove", "beta"])
        .assert()
        .success();
    wgmgr(&config)
        .args(["peer", "show", "beta"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown peer: beta"));
}

#[test]
fn test_subnet_change_replaces_pinned_address() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("wgmgr.conf");
    new_config(&config);
    wgmgr(&config)
        .args(["peer", "add", "gw", "-4", "192.168.1.5"])
        .assert()
        .success();

    wgmgr(&config)
        .args(["config", "set", "ipv4-subnet", "10.0.0.0/24"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: gw:"));

    wgmgr(&config)
        .args(["peer", "show", "gw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.1 (auto)"));
}

#[test]
fn test_links_and_rotation() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("wgmgr.conf");
    new_config(&config);
    for name in ["alpha", "beta"] {
        wgmgr(&config).args(["peer", "add", name]).assert().success();
    }

    wgmgr(&config)
        .args(["p2p", "add", "alpha", "beta", "--endpoint2", "beta.example:51820"])
        .assert()
        .success();
    wgmgr(&config)
        .args(["p2p", "add", "beta", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already linked"));

    wgmgr(&config)
        .args(["peer", "regenerate-keys", "beta"])
        .assert()
        .success()
        .stderr(predicate::str::contains("note: beta: link to peer alpha"));

    wgmgr(&config)
        .args(["p2p", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("beta.example:51820"))
        .stdout(predicate::str::contains("dangling").not());
}

#[test]
fn test_document_key_backend_keeps_other_keys() {
    let dir = TempDir::new().expect("temp dir");
    let document = dir.path().join("settings.json");
    fs::write(&document, r#"{"owner": "root"}"#).expect("write");

    wgmgr(&document)
        .args(["-k", "wgmgr", "config", "new"])
        .assert()
        .success();
    wgmgr(&document)
        .args(["-k", "wgmgr", "peer", "add", "alpha"])
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&document).expect("read")).expect("json");
    assert_eq!(value["owner"], "root");
    assert_eq!(value["wgmgr"]["peers"][0]["name"], "alpha");
}

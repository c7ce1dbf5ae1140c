#![allow(deprecated)]

/// CLI integration tests
///
/// These run the `fluxnova` binary and cover argument parsing and the
/// validation that happens before any backend or keyring access.
use assert_cmd::Command;
use predicates::prelude::*;
mod common;

fn fluxnova() -> Command {
    let mut cmd = Command::cargo_bin("fluxnova").unwrap();
    cmd.env_remove("FLUXNOVA_BASE_URL")
        .env_remove("FLUXNOVA_API_KEY")
        .env_remove("FLUXNOVA_DEFAULT_DURATION")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    fluxnova()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("view"))
        .stdout(predicate::str::contains("send"));
}

#[test]
fn test_version() {
    fluxnova().arg("--version").assert().success();
}

#[test]
fn test_send_requires_recipient() {
    fluxnova()
        .args(["send", "--image", "pic.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--to"));
}

#[test]
fn test_missing_api_key_is_rejected() {
    let (_temp_dir, config_path) =
        common::temp_config_file("api:\n  base_url: http://127.0.0.1:1\n");

    fluxnova()
        .arg("--config")
        .arg(config_path)
        .arg("feed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("api.api_key must be set"));
}

#[test]
fn test_non_http_base_url_is_rejected() {
    let (_temp_dir, config_path) =
        common::temp_config_file("api:\n  base_url: ftp://example.com\n  api_key: k\n");

    fluxnova()
        .arg("--config")
        .arg(config_path)
        .arg("feed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must use http or https"));
}

#[test]
fn test_send_duration_out_of_range() {
    let (_temp_dir, config_path) = common::temp_config_file("api:\n  api_key: k\n");

    fluxnova()
        .arg("--config")
        .arg(config_path)
        .args(["send", "--image", "pic.png", "--to", "alice", "--duration", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 1 and 10"));
}

#[test]
fn test_profile_delete_requires_confirmation() {
    let (_temp_dir, config_path) = common::temp_config_file("api:\n  api_key: k\n");

    fluxnova()
        .arg("--config")
        .arg(config_path)
        .args(["profile", "delete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

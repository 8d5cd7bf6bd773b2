//! Smoke tests -- verify the binary runs and the CLI surface is intact.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("floodgauge")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Concurrent UDP throughput benchmarking harness",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("floodgauge")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("floodgauge"));
}

#[test]
fn test_run_subcommand_exists() {
    Command::cargo_bin("floodgauge")
        .unwrap()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("--clients"));
}

#[test]
fn test_echo_subcommand_exists() {
    Command::cargo_bin("floodgauge")
        .unwrap()
        .args(["echo", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("--port"));
}

#[test]
fn test_run_rejects_missing_config_file() {
    Command::cargo_bin("floodgauge")
        .unwrap()
        .args(["run", "--config", "/nonexistent/floodgauge.toml"])
        .assert()
        .failure();
}

//! CLI integration tests

use std::process::Command;

fn cpln() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cpln"));
    for var in ["CPLN_ENDPOINT", "CPLN_ORG", "CPLN_TOKEN", "CPLN_GVC", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = cpln().arg("--help").output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Control Plane"), "Should show description");
    assert!(stdout.contains("list"), "Should show list command");
    assert!(stdout.contains("count"), "Should show count command");
    assert!(stdout.contains("get"), "Should show get command");
    assert!(stdout.contains("health"), "Should show health command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = cpln().arg("--version").output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("cpln"), "Should show binary name");
}

/// Test list subcommand help
#[test]
fn test_list_help() {
    let output = cpln()
        .args(["list", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "List help should succeed");
    assert!(stdout.contains("--workload"), "Should show workload option");
    assert!(stdout.contains("--max-results"), "Should show max-results option");
    assert!(stdout.contains("--no-cache"), "Should show no-cache option");
}

/// Test get subcommand requires a workload
#[test]
fn test_get_requires_workload() {
    let output = cpln()
        .args(["get", "app"])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Get without workload should fail");
    assert!(stderr.contains("--workload"), "Should mention missing workload");
}

/// Test that a missing token is reported before any request
#[test]
fn test_missing_token() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let output = cpln()
        .env("HOME", home.path())
        .args(["list", "--gvc", "prod", "--org", "acme"])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "List without token should fail");
    assert!(stderr.contains("No API token"), "Should explain the missing token");
}

/// Test that the GVC falls back to the config file
#[test]
fn test_missing_gvc() {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let output = cpln()
        .env("HOME", home.path())
        .args(["count", "--org", "acme", "--token", "secret"])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Count without GVC should fail");
    assert!(stderr.contains("No GVC given"), "Should explain the missing GVC");
}

//! CLI smoke tests for the workhub-server binary
//!
//! These tests verify that the CLI commands work correctly, including
//! configuration validation, help output, migrations and startup.

use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

/// Helper to run the workhub-server binary with given arguments
fn run_workhub_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_workhub-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute workhub-server")
}

/// Helper to run the workhub-server binary with timeout
async fn run_workhub_server_with_timeout(
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_workhub-server"));
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(timeout_duration, cmd.output()).await {
        Ok(result) => result.map_err(|e| e.into()),
        Err(elapsed) => Err(elapsed.into()),
    }
}

/// Config rooted in a temp dir so the database and logs stay inside it.
fn write_config(dir: &TempDir, name: &str, extra: &str) -> String {
    let path = dir.path().join(name);
    let content = format!(
        r#"
server:
  data_dir: "{}"
  host: "127.0.0.1"
  port: 0

database:
  url: "sqlite://workhub.db?mode=rwc"

logging:
  default:
    console_level: info
    file: ""
{extra}"#,
        dir.path().join("data").to_string_lossy().replace('\\', "/")
    );
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_workhub_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("workhub-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("migrate"), "Should contain 'migrate' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_workhub_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("workhub-server"), "Should contain binary name");
    assert!(
        stdout.chars().any(|c| c.is_ascii_digit()),
        "Should contain version numbers"
    );
}

#[test]
fn test_cli_invalid_command() {
    let output = run_workhub_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("unrecognized"),
        "Should contain error message about invalid command"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_workhub_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config"),
        "Should mention config file issue: {}",
        stderr
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");

    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_workhub_server(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "valid.yaml", "");

    let output = run_workhub_server(&["--config", &config_path, "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
        eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
    }
    assert!(output.status.success(), "Should succeed with valid config");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Configuration check passed"),
        "Should indicate successful validation: {}",
        stdout
    );
}

#[test]
fn test_cli_check_rejects_bad_module_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "module.yaml",
        r#"
modules:
  workspace_access:
    invite_ttl_hours: "forever"
"#,
    );

    let output = run_workhub_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Bad module config should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("workspace_access"),
        "Should name the module: {}",
        stderr
    );
}

#[test]
fn test_cli_mock_flag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("mock.yaml");

    // An unsupported database URL is replaced by --mock
    std::fs::write(
        &config_path,
        r#"
database:
  url: "mysql://localhost/nonexistent"
"#,
    )
    .expect("Failed to write config file");

    let without_mock = run_workhub_server(&["--config", config_path.to_str().unwrap(), "check"]);
    assert!(!without_mock.status.success());

    let output =
        run_workhub_server(&["--config", config_path.to_str().unwrap(), "--mock", "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(
        output.status.success(),
        "Should succeed with mock database even if the configured one is unsupported"
    );
}

#[test]
fn test_cli_migrate_creates_database_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "migrate.yaml", "");

    let output = run_workhub_server(&["--config", &config_path, "migrate"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "Migrate should succeed");
    assert!(temp_dir.path().join("data").join("workhub.db").exists());

    // Running again is a no-op.
    let again = run_workhub_server(&["--config", &config_path, "migrate"]);
    assert!(again.status.success(), "Second migrate should succeed");
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "print.yaml", "");

    let output = run_workhub_server(&["--config", &config_path, "--port", "9123", "--print-config"]);

    assert!(output.status.success(), "Print config should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9123"), "Port override missing: {}", stdout);
}

#[tokio::test]
async fn test_cli_run_command_with_mock_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "run.yaml", "");

    // Server should start and keep running until the timeout
    let result = run_workhub_server_with_timeout(
        &["--config", &config_path, "--mock", "run"],
        Duration::from_secs(10),
    )
    .await;

    match result {
        Err(err) => {
            assert!(
                err.to_string().contains("elapsed"),
                "Server failed to start: {}",
                err
            );
        }
        Ok(output) => {
            eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
            eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
            panic!("Server exited early with {:?}", output.status);
        }
    }
}

#[test]
fn test_cli_subcommand_help() {
    for (sub, needle) in [
        ("run", "Start the server"),
        ("check", "Check configuration"),
        ("migrate", "migrations"),
    ] {
        let output = run_workhub_server(&[sub, "--help"]);
        assert!(output.status.success(), "{sub} --help should succeed");

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains(needle), "{sub} help should mention '{needle}'");
    }
}

use std::fs;

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

/// A `command-gate` invocation isolated from the user's config files and env.
fn isolated(dir: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("command-gate");
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("COMMAND_GATE_ALLOWED_COMMANDS")
        .env_remove("COMMAND_GATE_RESTRICTED_COMMANDS")
        .env_remove("COMMAND_GATE_RESTRICTED_DIRECTORIES")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_shows_usage() {
    cargo_bin_cmd!("command-gate")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Policy gate"));
}

#[test]
fn test_version_shows_version() {
    cargo_bin_cmd!("command-gate")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("command-gate"));
}

#[test]
fn test_restricted_command_is_denied() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args(["check", "STOP-SERVICE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'STOP-SERVICE' is restricted"));
}

#[test]
fn test_network_command_is_allowed() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args(["check", "Invoke-RestMethod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("allowed"));
}

#[test]
fn test_restricted_directory_flag() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args([
            "--restricted-directories",
            r"C:\Restricted,C:\Windows",
            "check",
            "Get-Content",
            "--path",
            r"C:\Allowed\file.txt",
            "--path",
            r"C:\Restricted\secret.txt",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r"C:\Restricted\secret.txt"));
}

#[test]
fn test_relative_path_is_allowed() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args([
            "--restricted-directories",
            r"C:\Windows",
            "check",
            "Get-Content",
            "--cwd",
            r"C:\Windows",
            "--path",
            r"System32\config",
        ])
        .assert()
        .success();
}

#[test]
fn test_env_drive_is_denied() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args(["check", "Get-ChildItem", "--path", r"env:\path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("restricted by policy"));
}

#[test]
fn test_allowed_commands_flag_overrides_deny_list() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args(["--allowed-commands", "Stop-Service", "check", "Stop-Service"])
        .assert()
        .success();
}

#[test]
fn test_env_var_overrides_deny_list() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .env("COMMAND_GATE_RESTRICTED_COMMANDS", "Remove-Item")
        .args(["check", "Stop-Service"])
        .assert()
        .success();
    isolated(&dir)
        .env("COMMAND_GATE_RESTRICTED_COMMANDS", "Remove-Item")
        .args(["check", "remove-item"])
        .assert()
        .failure();
}

#[test]
fn test_blank_deny_list_keeps_defaults() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .env("COMMAND_GATE_RESTRICTED_COMMANDS", "")
        .args(["check", "Stop-Service"])
        .assert()
        .failure();
    isolated(&dir)
        .args(["--restricted-commands", " , ", "check", "Stop-Service"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Stop-Service' is restricted"));
}

#[test]
fn test_project_config_file_is_loaded() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(".command-gate.toml"),
        "[policy]\nrestricted_commands = [\"Get-Process\"]\n",
    )
    .unwrap();
    isolated(&dir)
        .args(["check", "Get-Process"])
        .assert()
        .failure();
}

#[test]
fn test_explicit_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("gate.toml");
    fs::write(
        &config,
        "platform = \"windows\"\n[policy]\nallowed_commands = [\"reg.exe\"]\n",
    )
    .unwrap();
    isolated(&dir)
        .arg("--config")
        .arg(&config)
        .args(["check", "reg.exe"])
        .assert()
        .success();
    isolated(&dir)
        .arg("--config")
        .arg(&config)
        .args(["check", "TASKKILL.EXE"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_root_fails_gracefully() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args(["--restricted-directories", "relative/dir", "check", "ls"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid restricted root"));
}

#[test]
fn test_json_decision() {
    let dir = tempdir().unwrap();
    let output = isolated(&dir)
        .args(["check", "spsv", "--json"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let decision: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(decision["allowed"], false);
    assert_eq!(decision["kind"], "command_restricted");
    assert_eq!(decision["command"], "spsv");
}

#[test]
fn test_defaults_lists_windows_entries() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args(["defaults", "--platform", "windows"])
        .assert()
        .success()
        .stdout(predicate::str::contains("taskkill.exe"))
        .stdout(predicate::str::is_match(r"namespace\s+HKLM:").unwrap())
        .stdout(predicate::str::is_match(r"directory\s+C:\\Windows").unwrap());
}

#[test]
fn test_defaults_rejects_unknown_platform() {
    let dir = tempdir().unwrap();
    isolated(&dir)
        .args(["defaults", "--platform", "beos"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown platform"));
}

//! Integration tests for CLI commands.
//!
//! Each test runs the binary against a fresh project in a temporary
//! directory with the file-backed ledger.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn trustgate(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trustgate").unwrap();
    cmd.env_remove("TRUSTGATE_CALLER")
        .env("TRUSTGATE_LEDGER__FSYNC", "false")
        .args(["--project-dir", project.to_str().unwrap()]);
    cmd
}

/// A project seeded with User0/User1 and a few devices.
fn seeded_project() -> TempDir {
    let temp = TempDir::new().unwrap();

    Command::cargo_bin("trustgate")
        .unwrap()
        .args(["init", temp.path().to_str().unwrap(), "--seed", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User0, User1"));

    let devices: [&[&str]; 3] = [
        &["Sensor1", "--network", "127.2.2.0", "--type", "Sensor", "--zone", "B"],
        &[
            "Actuator2", "--network", "127.9.9.0", "--type", "Actuator", "--zone", "B",
            "--security-level", "High", "--window-start", "10", "--window-end", "100",
        ],
        &["Peer1", "--network", "127.9.9.0", "--type", "Both", "--zone", "C", "--security-level", "High"],
    ];
    for args in devices {
        trustgate(temp.path())
            .args(["--caller", "User0", "device", "add"])
            .args(args)
            .assert()
            .success();
    }

    temp
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn init_writes_config_and_gitignore() {
    let temp = TempDir::new().unwrap();

    trustgate(temp.path())
        .args(["init", temp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project initialized successfully"));

    let config = fs::read_to_string(temp.path().join("trustgate.toml")).unwrap();
    assert!(config.contains("backend = \"file\""));
    let gitignore = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains(".trustgate/"));
}

#[test]
fn reinit_without_yes_needs_a_terminal() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().to_str().unwrap();

    trustgate(temp.path()).args(["init", path]).assert().success();

    trustgate(temp.path())
        .args(["init", path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    trustgate(temp.path())
        .args(["init", path, "--yes"])
        .assert()
        .success();
}

#[test]
fn seeding_twice_is_rejected() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["init", temp.path().to_str().unwrap(), "--seed", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn commands_fail_outside_a_project() {
    let temp = TempDir::new().unwrap();

    trustgate(temp.path())
        .args(["user", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn memory_backend_from_environment_needs_no_project() {
    let temp = TempDir::new().unwrap();

    trustgate(temp.path())
        .env("TRUSTGATE_LEDGER__BACKEND", "memory")
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No users registered"));

    assert!(!temp.path().join(".trustgate").exists());
}

#[test]
fn config_show_supports_formats() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Authorization"));

    trustgate(temp.path())
        .args(["config", "show", "--format", "toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("authorization = \"ledger-admin\""));

    trustgate(temp.path())
        .env("TRUSTGATE_TRUST__AUTO_DEACTIVATE_AT_ZERO", "true")
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"auto_deactivate_at_zero\": true"));
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn registry_commands_require_a_caller() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["user", "add", "User2", "--network", "127.4.4.0", "--level", "Guest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--caller"));
}

#[test]
fn non_admin_caller_is_rejected() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["--caller", "Mallory", "user", "add", "User2", "--network", "n", "--level", "Admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not authorized"));

    trustgate(temp.path())
        .args(["user", "show", "User2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn caller_can_come_from_the_environment() {
    let temp = seeded_project();

    trustgate(temp.path())
        .env("TRUSTGATE_CALLER", "User1")
        .args(["user", "add", "Guest1", "--network", "127.4.4.0", "--level", "Guest", "--zone", "A"])
        .assert()
        .success();

    trustgate(temp.path())
        .args(["user", "show", "Guest1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"userlevel\": \"Guest\""))
        .stdout(predicate::str::contains("\"utrustlevel\": 50"));
}

#[test]
fn duplicate_registration_is_rejected() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["--caller", "User0", "device", "add", "Sensor1", "--network", "n", "--type", "Sensor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn device_update_changes_attributes() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["--caller", "User0", "device", "update", "Sensor1", "--zone", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated device"));

    trustgate(temp.path())
        .args(["device", "show", "Sensor1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dzone\": \"A\""));
}

#[test]
fn deactivate_needs_confirmation() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["--caller", "User0", "device", "deactivate", "Peer1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    trustgate(temp.path())
        .args(["--caller", "User0", "device", "deactivate", "Peer1", "--yes"])
        .assert()
        .success();

    trustgate(temp.path())
        .args(["device", "show", "Peer1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dstatus\": \"Deactivated\""));
}

#[test]
fn list_shows_registered_records() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User0"))
        .stdout(predicate::str::contains("User1"))
        .stdout(predicate::str::contains("(2 users)"));

    trustgate(temp.path())
        .args(["device", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(3 devices)"));
}

// ============================================================================
// Requests and Feedback
// ============================================================================

#[test]
fn admin_on_same_network_is_allowed_and_stored() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args([
            "request", "evaluate", "R1", "--type", "U2D", "--action", "Read",
            "--requester", "User0", "--device", "Sensor1", "--time", "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOW"))
        .stdout(predicate::str::contains("admin-same-network"));

    trustgate(temp.path())
        .args(["request", "permission", "R1"])
        .assert()
        .success()
        .stdout("ALLOW\n");
}

#[test]
fn action_outside_window_is_denied_with_zero_exit() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args([
            "request", "evaluate", "R2", "--type", "U2D", "--action", "Action",
            "--requester", "User0", "--device", "Actuator2", "--time", "500",
            "--format", "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"permission\": \"DENY\""))
        .stdout(predicate::str::contains("\"rule\": \"outside-window\""));
}

#[test]
fn device_to_device_window_with_matching_security() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args([
            "request", "evaluate", "R3", "--type", "D2D", "--action", "Action",
            "--requester", "Peer1", "--device", "Actuator2", "--time", "100",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("peer-window-security"));
}

#[test]
fn unknown_device_is_denied() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args([
            "request", "evaluate", "R4", "--type", "U2D", "--action", "Read",
            "--requester", "User0", "--device", "Ghost",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("DENY"))
        .stdout(predicate::str::contains("unknown-device"));
}

#[test]
fn invalid_request_type_stores_nothing() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args([
            "request", "evaluate", "R5", "--type", "X2D", "--action", "Read",
            "--requester", "User0", "--device", "Sensor1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid request type"));

    trustgate(temp.path())
        .args(["request", "show", "R5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn feedback_adjusts_both_parties() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args([
            "request", "evaluate", "R1", "--type", "U2D", "--action", "Read",
            "--requester", "User0", "--device", "Sensor1", "--time", "5",
        ])
        .assert()
        .success();

    // User0 is already at the ceiling; the sensor drops from the default.
    trustgate(temp.path())
        .args(["feedback", "R1", "Satisfactory", "stale reading", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"requester\": \"user/User0\""))
        .stdout(predicate::str::contains("\"after\": 100"))
        .stdout(predicate::str::contains("\"after\": 49"));

    trustgate(temp.path())
        .args(["device", "show", "Sensor1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dtrustlevel\": 49"));
}

#[test]
fn feedback_label_is_case_sensitive() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args([
            "request", "evaluate", "R1", "--type", "U2D", "--action", "Read",
            "--requester", "User0", "--device", "Sensor1", "--time", "5",
        ])
        .assert()
        .success();

    // Lowercase is not the positive label, so both parties lose a step.
    trustgate(temp.path())
        .args(["feedback", "R1", "satisfactory", "satisfactory", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"after\": 99"))
        .stdout(predicate::str::contains("\"after\": 49"));

    trustgate(temp.path())
        .args(["user", "show", "User0", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"utrustlevel\": 99"));
}

#[test]
fn feedback_for_missing_request_fails() {
    let temp = seeded_project();

    trustgate(temp.path())
        .args(["feedback", "Nope", "Satisfactory", "Satisfactory"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("request 'Nope' not found"));
}

#[test]
fn request_list_shows_stored_verdicts() {
    let temp = seeded_project();

    for (key, device) in [("R1", "Sensor1"), ("R2", "Ghost")] {
        trustgate(temp.path())
            .args([
                "request", "evaluate", key, "--type", "U2D", "--action", "Read",
                "--requester", "User0", "--device", device, "--time", "5",
            ])
            .assert()
            .success();
    }

    trustgate(temp.path())
        .args(["request", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOW"))
        .stdout(predicate::str::contains("DENY"))
        .stdout(predicate::str::contains("(2 requests)"));
}

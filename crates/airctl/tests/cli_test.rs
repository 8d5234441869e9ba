//! Integration tests for the `airctl` CLI binary.
//!
//! Argument parsing, completions, and config handling run without a
//! purifier. The end-to-end tests stand up a fake bridge on localhost.
#![allow(clippy::unwrap_used)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `airctl` binary with env isolation.
///
/// Clears all `AIRCTL_*` env vars and points config directories at
/// `config_home` so tests never touch the user's real configuration.
fn airctl_cmd(config_home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("airctl");
    cmd.env("HOME", config_home)
        .env("XDG_CONFIG_HOME", config_home)
        .env("NO_COLOR", "1")
        .env_remove("AIRCTL_PROFILE")
        .env_remove("AIRCTL_HOST")
        .env_remove("AIRCTL_PORT")
        .env_remove("AIRCTL_OUTPUT")
        .env_remove("AIRCTL_WAIT")
        .env_remove("AIRCTL_DEFAULT_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(config_home: &Path, body: &str) {
    let dir = config_home.join("airctl");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), body).unwrap();
}

/// A port nothing listens on.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn status_line() -> String {
    let mut line = json!({
        "type": "status",
        "data": {
            "DeviceId": "dev-1",
            "name": "Living Room",
            "modelid": "AC2889",
            "swversion": "1.0.7",
            "WifiVersion": "AWS_Philips_AIR@62",
            "pwr": "1",
            "mode": "P",
            "om": "2"
        }
    })
    .to_string();
    line.push('\n');
    line
}

/// Fake bridge: sends one status push on connect, then acks every
/// control request with `ok` and reports its values on the channel.
fn spawn_bridge(ok: bool) -> (u16, mpsc::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let Ok((socket, _)) = listener.accept() else {
            return;
        };
        serve(&socket, ok, &tx);
    });

    (port, rx)
}

fn serve(socket: &TcpStream, ok: bool, controls: &mpsc::Sender<Value>) {
    let mut writer = socket.try_clone().unwrap();
    writer.write_all(status_line().as_bytes()).unwrap();

    for line in BufReader::new(socket).lines() {
        let Ok(line) = line else { break };
        let request: Value = serde_json::from_str(&line).unwrap();
        let ack = json!({ "type": "ack", "id": request["id"], "ok": ok });
        let _ = controls.send(request["values"].clone());
        if writer
            .write_all(format!("{ack}\n").as_bytes())
            .is_err()
        {
            break;
        }
    }
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = airctl_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    airctl_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("status")
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("speed")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    airctl_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("airctl"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    airctl_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_mode_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    airctl_cmd(home.path())
        .args(["mode", "hurricane"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("hurricane"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_into_config_home() {
    let home = tempfile::tempdir().unwrap();
    airctl_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_missing_config_reports_no_purifier() {
    let home = tempfile::tempdir().unwrap();
    airctl_cmd(home.path())
        .arg("status")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No purifier configured"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        "default_profile = \"bedroom\"\n\n[profiles.bedroom]\nhost = \"10.0.0.40\"\n",
    );
    airctl_cmd(home.path())
        .args(["--profile", "attic", "on"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("attic"));
}

#[test]
fn test_config_use_switches_default() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        "default_profile = \"bedroom\"\n\n\
         [profiles.bedroom]\nhost = \"10.0.0.40\"\n\n\
         [profiles.office]\nhost = \"office.lan\"\n",
    );

    airctl_cmd(home.path())
        .args(["config", "use", "office"])
        .assert()
        .success();

    airctl_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* office"));
}

// ── Connection failures ─────────────────────────────────────────────

#[test]
fn test_unreachable_purifier_times_out() {
    let home = tempfile::tempdir().unwrap();
    let port = closed_port().to_string();
    airctl_cmd(home.path())
        .args(["--host", "127.0.0.1", "--port", &port, "--wait", "1", "on"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("Timed out"));
}

// ── End to end ──────────────────────────────────────────────────────

#[test]
fn test_status_prints_first_push() {
    let home = tempfile::tempdir().unwrap();
    let (port, _controls) = spawn_bridge(true);

    let output = airctl_cmd(home.path())
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(["--output", "json-compact", "status"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{output:?}");
    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["name"], "Living Room");
    assert_eq!(status["is_on"], true);
    assert_eq!(status["mode"], "auto");
    assert_eq!(status["fan_speed"], "speed2");
}

#[test]
fn test_speed_sends_manual_mode_and_speed() {
    let home = tempfile::tempdir().unwrap();
    let (port, controls) = spawn_bridge(true);

    airctl_cmd(home.path())
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(["speed", "turbo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("turbo"));

    let values = controls.recv().unwrap();
    assert_eq!(values, json!({ "mode": "M", "om": "t" }));
}

#[test]
fn test_rejected_command_exits_with_rejection_code() {
    let home = tempfile::tempdir().unwrap();
    let (port, controls) = spawn_bridge(false);

    airctl_cmd(home.path())
        .args(["--host", "127.0.0.1", "--port", &port.to_string(), "off"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("rejected"));

    assert_eq!(controls.recv().unwrap(), json!({ "pwr": "0" }));
}

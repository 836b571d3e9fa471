//! CLI integration tests.
//!
//! Each test uses an isolated temp directory for the database and the
//! session file, so tests can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Value;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn session_file(&self, device: &str) -> PathBuf {
        self.temp_dir.path().join(format!("{}.toml", device))
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["admin", "init", "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("homepage").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd.env("HOMEPAGE_DATA_DIR", self.data_dir());
        cmd.env("HOMEPAGE_SESSION_FILE", self.session_file("device"));
        cmd
    }

    /// Command running as a second device with its own session.
    fn other_device(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("HOMEPAGE_SESSION_FILE", self.session_file("other"));
        cmd
    }

    fn create(&self, name: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["create", name, "--non-interactive"])
            .assert()
    }

    fn status_json(&self, cmd: &mut Command) -> Value {
        let output = cmd
            .args(["status", "--json"])
            .output()
            .expect("failed to run command");
        assert!(output.status.success(), "status failed: {:?}", output);
        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }

    fn info_json(&self) -> Value {
        let output = self
            .cmd()
            .args(["admin", "info", "--json"])
            .output()
            .expect("failed to run command");

        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }

    fn current_group_id(&self) -> String {
        self.status_json(&mut self.cmd())["group"]["id"]
            .as_str()
            .expect("not in a group")
            .to_string()
    }

    fn remove_group(&self, group_id: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([
                "admin",
                "remove-group",
                "--group-id",
                group_id,
                "--non-interactive",
                "--yes",
            ])
            .assert()
    }
}

fn binary() -> PathBuf {
    assert_cmd::cargo::cargo_bin("homepage")
}

#[test]
fn test_admin_init() {
    let ctx = TestContext::new();
    ctx.init()
        .success()
        .stdout(predicate::str::contains("Initialized database at"));

    assert!(ctx.data_dir().join("homepage.db").exists());

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Database already initialized at"));
}

#[test]
fn test_commands_require_init() {
    let ctx = TestContext::new();
    ctx.create("Lake House")
        .failure()
        .stderr(predicate::str::contains("homepage admin init"));
}

#[test]
fn test_create_stores_group_in_session() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.create("  Magnus Home!! ")
        .success()
        .stdout(predicate::str::contains("Created group \"Magnus Home!!\" (magnus-home)"));

    let status = ctx.status_json(&mut ctx.cmd());
    assert_eq!(status["group"]["key"], "magnus-home");
    assert!(ctx.session_file("device").exists());

    let contents = std::fs::read_to_string(ctx.session_file("device")).unwrap();
    assert!(contents.contains(status["group"]["id"].as_str().unwrap()));
}

#[test]
fn test_create_taken_name_fails() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.create("Magnus Home").success();

    ctx.other_device()
        .args(["create", "MAGNUS-HOME", "--non-interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already taken"));

    assert!(ctx.status_json(&mut ctx.other_device())["group"].is_null());
    assert_eq!(ctx.info_json()["groups"].as_array().unwrap().len(), 1);
}

#[test]
fn test_create_invalid_name_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.create("---")
        .failure()
        .stderr(predicate::str::contains("not a usable name"));
}

#[test]
fn test_create_without_name_non_interactive_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["create", "--non-interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("A name is required"));
}

#[test]
fn test_join_from_another_device() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.create("Lake House").success();
    let id = ctx.current_group_id();

    ctx.other_device()
        .args(["join", "lake house", "--non-interactive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Joined group \"Lake House\""));

    let status = ctx.status_json(&mut ctx.other_device());
    assert_eq!(status["group"]["id"], id.as_str());
}

#[test]
fn test_join_unknown_name_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["join", "Nowhere", "--non-interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No group named 'Nowhere' exists"));
}

#[test]
fn test_rename_moves_claim() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.create("Magnus Home").success();
    let id = ctx.current_group_id();

    ctx.cmd()
        .args(["rename", "Lake House", "--non-interactive"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Renamed group \"Magnus Home\" to \"Lake House\" (lake-house)",
        ));

    let info = ctx.info_json();
    let claims = info["claims"].as_array().unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0]["key"], "lake-house");
    assert_eq!(claims[0]["group_id"], id.as_str());

    ctx.other_device()
        .args(["join", "Magnus Home", "--non-interactive"])
        .assert()
        .failure();
}

#[test]
fn test_rename_onto_taken_name_fails() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.other_device()
        .args(["create", "Beta", "--non-interactive"])
        .assert()
        .success();
    ctx.create("Alpha").success();

    ctx.cmd()
        .args(["rename", "beta", "--non-interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already taken"));

    let status = ctx.status_json(&mut ctx.cmd());
    assert_eq!(status["group"]["key"], "alpha");
}

#[test]
fn test_rename_outside_group_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["rename", "Lake House", "--non-interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a group"));
}

#[test]
fn test_switch_leaves_group() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.create("Lake House").success();

    ctx.cmd()
        .args(["switch", "--non-interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes is required"));

    ctx.cmd()
        .args(["switch", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Left group \"Lake House\""));

    assert!(ctx.status_json(&mut ctx.cmd())["group"].is_null());
    // leaving does not delete the group
    assert_eq!(ctx.info_json()["groups"].as_array().unwrap().len(), 1);
}

#[test]
fn test_nickname() {
    let ctx = TestContext::new();

    ctx.cmd()
        .arg("nickname")
        .assert()
        .success()
        .stdout(predicate::str::contains("No nickname set."));

    ctx.cmd()
        .args(["nickname", "  Ada  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nickname set to \"Ada\""));

    ctx.cmd()
        .arg("nickname")
        .assert()
        .success()
        .stdout(predicate::str::diff("Ada\n"));

    ctx.cmd()
        .args(["nickname", "   "])
        .assert()
        .failure();

    ctx.cmd()
        .args(["nickname", "--clear"])
        .assert()
        .success();

    ctx.cmd()
        .arg("nickname")
        .assert()
        .success()
        .stdout(predicate::str::contains("No nickname set."));
}

#[test]
fn test_status_clears_removed_group() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.create("Lake House").success();
    ctx.cmd().args(["nickname", "Ada"]).assert().success();
    let id = ctx.current_group_id();

    ctx.remove_group(&id)
        .success()
        .stdout(predicate::str::contains("Deleted group 'Lake House'"));

    let status = ctx.status_json(&mut ctx.cmd());
    assert!(status["group"].is_null());
    assert_eq!(status["nickname"], "Ada");

    let contents = std::fs::read_to_string(ctx.session_file("device")).unwrap();
    assert!(!contents.contains(&id));
}

#[test]
fn test_admin_info_lists_groups_and_claims() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.create("Alpha").success();
    ctx.other_device()
        .args(["create", "Beta", "--non-interactive"])
        .assert()
        .success();

    let info = ctx.info_json();
    let mut keys: Vec<_> = info["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["key"].as_str().unwrap().to_string())
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["alpha", "beta"]);
    assert_eq!(info["claims"].as_array().unwrap().len(), 2);

    ctx.cmd()
        .args(["admin", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Groups:  2"));
}

#[test]
fn test_admin_remove_group() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.create("Lake House").success();
    let id = ctx.current_group_id();

    ctx.remove_group(&id).success();
    let info = ctx.info_json();
    assert!(info["groups"].as_array().unwrap().is_empty());
    assert!(info["claims"].as_array().unwrap().is_empty());

    ctx.remove_group(&id)
        .failure()
        .stderr(predicate::str::contains("Group not found"));
}

#[test]
fn test_watch_exits_when_group_removed() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.create("Lake House").success();
    let id = ctx.current_group_id();

    let mut child = std::process::Command::new(binary())
        .args(["watch", "--interval-ms", "50"])
        .env("HOMEPAGE_DATA_DIR", ctx.data_dir())
        .env("HOMEPAGE_SESSION_FILE", ctx.session_file("device"))
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn watch");

    let stdout = child.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let first = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("watch printed nothing");
    assert_eq!(first, "Group: \"Lake House\" (lake-house)");

    ctx.remove_group(&id).success();

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().ok();
            panic!("watch did not exit after the group was removed");
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    assert!(status.success());

    let rest: Vec<String> = rx.iter().collect();
    assert!(rest.iter().any(|line| line == "The group was removed."));
    assert!(ctx.status_json(&mut ctx.cmd())["group"].is_null());
}

#[test]
fn test_watch_outside_group_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["watch", "--interval-ms", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a group"));
}

//! Exercises the hidden `test-lock` subcommand end-to-end: spawn it as a
//! real child process holding `.molt/molt.lock`, send it a signal, and
//! confirm it exits cleanly and releases the lock rather than leaving it
//! behind for the next invocation to trip over.

use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use assert_cmd::cargo::CommandCargoExt;
use tempfile::TempDir;

fn spawn_test_lock(dir: &std::path::Path, delay_ms: u64) -> std::process::Child {
    let mut cmd = Command::cargo_bin("molt").unwrap();
    cmd.arg("-C")
        .arg(dir)
        .arg("test-lock")
        .arg("--delay")
        .arg(delay_ms.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd.spawn().expect("failed to spawn molt test-lock")
}

fn wait_for_lock(dir: &std::path::Path) {
    let lock_path = dir.join(".molt").join("molt.lock");
    for _ in 0..50 {
        if lock_path.exists() {
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("lock file was never created at {}", lock_path.display());
}

#[test]
fn sigint_releases_the_lock_before_exiting() {
    let tmp = TempDir::new().unwrap();
    let mut child = spawn_test_lock(tmp.path(), 5000);
    wait_for_lock(tmp.path());

    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGINT);
    }

    let status = child.wait().expect("child did not exit");
    assert!(status.success());
    assert!(!tmp.path().join(".molt").join("molt.lock").exists());
}

#[test]
fn sigterm_releases_the_lock_before_exiting() {
    let tmp = TempDir::new().unwrap();
    let mut child = spawn_test_lock(tmp.path(), 5000);
    wait_for_lock(tmp.path());

    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }

    let status = child.wait().expect("child did not exit");
    assert!(status.success());
    assert!(!tmp.path().join(".molt").join("molt.lock").exists());
}

#[test]
fn an_uninterrupted_run_releases_the_lock_on_its_own() {
    let tmp = TempDir::new().unwrap();
    let mut child = spawn_test_lock(tmp.path(), 200);
    let status = child.wait().expect("child did not exit");
    assert!(status.success());
    assert!(!tmp.path().join(".molt").join("molt.lock").exists());
}

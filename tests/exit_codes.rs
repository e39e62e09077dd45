//! Exit statuses of complete runs against a scripted engine.
//!
//! | engine | msync | reason                                |
//! |--------|-------|---------------------------------------|
//! | 0      | 0     | success                               |
//! | 23     | 0     | partial transfer counts as success    |
//! | 24     | 0     | vanished source files count as success|
//! | other  | same  | passed through                        |
#![cfg(unix)]

mod common;

use common::Workspace;
use msync_core::exit_code::ExitCode;
use predicates::prelude::*;

fn run_with_transfer_exit(code: i32) -> (std::process::Output, Workspace) {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake.transfer_exit(code));
    let output = workspace
        .command(&fake)
        .arg("-q")
        .arg("rsync://u1.example/m/")
        .arg(&workspace.dest)
        .output()
        .expect("run msync");
    (output, workspace)
}

#[test]
fn success_exits_zero() {
    let (output, workspace) = run_with_transfer_exit(0);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stderr.is_empty());
    assert!(workspace.dest.is_dir());
    assert!(workspace.lock_files().is_empty());
}

#[test]
fn partial_transfer_is_remapped_to_zero() {
    let (output, _workspace) = run_with_transfer_exit(23);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn vanished_files_are_remapped_to_zero() {
    let (output, _workspace) = run_with_transfer_exit(24);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn engine_failures_pass_through() {
    let (output, workspace) = run_with_transfer_exit(11);
    assert_eq!(output.status.code(), Some(11));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.ends_with("msync error: rsync exited with code 11: error in file IO (code 11)\n"));
    assert!(workspace.lock_files().is_empty());
}

#[test]
fn missing_engine_reports_command_not_found() {
    let workspace = Workspace::new();
    workspace
        .command(&workspace.install(|fake| fake))
        .env("MSYNC_RSYNC", workspace.scratch().join("no-such-rsync"))
        .args(["-q", "--skip-connection-check", "rsync://u1.example/m/"])
        .arg(&workspace.dest)
        .assert()
        .code(ExitCode::CommandNotFound.as_i32())
        .stderr(predicate::str::starts_with("msync error: "));
    assert!(workspace.lock_files().is_empty());
}

#[test]
fn marker_sync_without_url_is_a_usage_error() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);
    workspace
        .command(&fake)
        .args(["-q", "--last-update-sync", "/dists/", "rsync://u1.example/m/"])
        .arg(&workspace.dest)
        .assert()
        .code(ExitCode::Syntax.as_i32())
        .stderr("msync error: --last-update-sync requires --last-update-url (code 1)\n");
    assert!(fake.invocations().expect("log").is_empty());
    assert!(workspace.lock_files().is_empty());
    assert!(!workspace.dest.exists());
}

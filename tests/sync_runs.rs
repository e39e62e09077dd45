//! End-to-end runs of the `msync` binary against a scripted engine.
#![cfg(unix)]

mod common;

use std::fs::{self, OpenOptions};

use assert_cmd::Command;
use common::Workspace;
use fs2::FileExt;
use predicates::prelude::*;

const U1: &str = "rsync://u1.example/m/";
const U2: &str = "rsync://u2.example/m/";
const U3: &str = "rsync://u3.example/m/";

fn source_of(invocation: &str) -> &str {
    let mut args: Vec<&str> = invocation.split(' ').collect();
    args.pop();
    args.pop().unwrap_or_default()
}

#[test]
fn first_reachable_upstream_is_used() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake.probe_exit_for(U1, 10));

    workspace
        .command(&fake)
        .args(["-q", U1, U2, U3])
        .arg(&workspace.dest)
        .assert()
        .success();

    let probes = fake.probes().expect("log");
    assert_eq!(probes.len(), 2);
    assert!(probes[0].ends_with(U1));
    assert!(probes[1].ends_with(U2));
    assert!(probes.iter().all(|probe| probe.contains("--no-motd")));

    let transfers = fake.transfers().expect("log");
    assert_eq!(transfers.len(), 1);
    assert_eq!(source_of(&transfers[0]), U2);
    assert!(transfers[0].ends_with(&*workspace.dest.to_string_lossy()));
}

#[test]
fn skipping_the_probe_surfaces_the_first_upstream_failure() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake.probe_exit_for(U1, 10).transfer_exit_for(U1, 10));

    workspace
        .command(&fake)
        .args(["-q", "--skip-connection-check", U1, U2])
        .arg(&workspace.dest)
        .assert()
        .code(10)
        .stderr(predicate::str::contains("rsync exited with code 10"));

    assert!(fake.probes().expect("log").is_empty());
    let transfers = fake.transfers().expect("log");
    assert_eq!(transfers.len(), 1);
    assert_eq!(source_of(&transfers[0]), U1);
}

#[test]
fn extra_options_reach_probe_and_transfer() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);

    workspace
        .command(&fake)
        .args(["-q", "-n", "--rsync-option=--exclude=*.iso", U1])
        .arg(&workspace.dest)
        .assert()
        .success();

    for line in fake.invocations().expect("log") {
        assert!(line.contains("--dry-run --exclude=*.iso"), "{line}");
    }
}

#[test]
fn unchanged_marker_syncs_only_the_suffix() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);
    let remote = workspace.scratch().join("remote");
    fs::create_dir_all(&remote).expect("remote dir");
    fs::create_dir_all(&workspace.dest).expect("dest dir");
    fs::write(remote.join("last-update"), "1700000000\n").expect("remote marker");
    fs::write(workspace.dest.join("last-update"), " 1700000000 ").expect("local marker");
    let url = format!("file://{}", remote.join("last-update").display());

    workspace
        .command(&fake)
        .args(["-q", "--last-update-url", &url, "--last-update-sync", "dists/", U1])
        .arg(&workspace.dest)
        .assert()
        .success();

    let transfers = fake.transfers().expect("log");
    assert_eq!(transfers.len(), 1);
    assert_eq!(source_of(&transfers[0]), "rsync://u1.example/m/dists/");
}

#[test]
fn matching_marker_runs_are_idempotent() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);
    let remote = workspace.scratch().join("remote");
    fs::create_dir_all(&remote).expect("remote dir");
    fs::create_dir_all(&workspace.dest).expect("dest dir");
    fs::write(remote.join("last-update"), "1700000000\n").expect("remote marker");
    fs::write(workspace.dest.join("last-update"), "1700000000\n").expect("local marker");
    let url = format!("file://{}", remote.join("last-update").display());

    let mut listings = Vec::new();
    for _ in 0..2 {
        workspace
            .command(&fake)
            .args(["-q", "--last-update-url", &url, "--last-update-sync", "dists/", U1])
            .arg(&workspace.dest)
            .assert()
            .success();
        listings.push(workspace.dest_listing());
    }

    let transfers = fake.transfers().expect("log");
    assert_eq!(transfers.len(), 2);
    for transfer in &transfers {
        assert_eq!(source_of(transfer), "rsync://u1.example/m/dists/");
    }
    assert_eq!(listings[0], listings[1]);
    assert_eq!(listings[0], vec!["last-update".to_owned()]);
}

#[test]
fn changed_marker_syncs_everything() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);
    let remote = workspace.scratch().join("remote");
    fs::create_dir_all(&remote).expect("remote dir");
    fs::create_dir_all(&workspace.dest).expect("dest dir");
    fs::write(remote.join("last-update"), "1700000600\n").expect("remote marker");
    fs::write(workspace.dest.join("last-update"), "1700000000\n").expect("local marker");
    let url = format!("file://{}", remote.join("last-update").display());

    workspace
        .command(&fake)
        .args(["-q", "--last-update-url", &url, "--last-update-sync", "dists/", U1])
        .arg(&workspace.dest)
        .assert()
        .success();

    let transfers = fake.transfers().expect("log");
    assert_eq!(source_of(&transfers[0]), U1);
}

#[test]
fn missing_local_marker_forces_full_sync() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);
    let remote = workspace.scratch().join("remote");
    fs::create_dir_all(&remote).expect("remote dir");
    fs::write(remote.join("last-update"), "1700000000\n").expect("remote marker");
    let url = format!("file://{}", remote.join("last-update").display());

    workspace
        .command(&fake)
        .args(["-q", "--last-update-url", &url, "--last-update-sync", "dists/", U1])
        .arg(&workspace.dest)
        .assert()
        .success();

    let transfers = fake.transfers().expect("log");
    assert_eq!(source_of(&transfers[0]), U1);
}

#[test]
fn held_lock_skips_the_run() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);
    let lock_path = workspace.scratch().join("msync-held.lck");
    let holder = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .expect("open lock");
    holder.lock_exclusive().expect("hold lock");

    workspace
        .command(&fake)
        .args(["-q", "--id", "held", U1])
        .arg(&workspace.dest)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    assert!(fake.invocations().expect("log").is_empty());
    assert!(lock_path.exists());
    assert!(!workspace.dest.exists());
    FileExt::unlock(&holder).expect("unlock");
}

#[test]
fn repeated_runs_leave_no_lock_or_scratch_behind() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);

    for _ in 0..2 {
        workspace
            .command(&fake)
            .args(["-q", "--id", "repeat", U1])
            .arg(&workspace.dest)
            .assert()
            .success();
        assert!(workspace.lock_files().is_empty());
        assert!(!workspace.scratch().join("msync-repeat").exists());
    }

    let transfers = fake.transfers().expect("log");
    assert_eq!(transfers.len(), 2);
    let scratch = workspace.scratch().join("msync-repeat");
    assert!(transfers[0].contains(&format!("--temp-dir={}", scratch.display())));
}

#[test]
fn slow_run_warns_on_stderr() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);

    workspace
        .command(&fake)
        .args(["--warning-timeout", "0", U1])
        .arg(&workspace.dest)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "msync warning: synchronization took longer than the warning timeout",
        ));
}

#[test]
fn scratch_inside_destination_is_a_configuration_error() {
    let workspace = Workspace::new();
    let fake = workspace.install(|fake| fake);
    let nested = workspace.dest.join(".msync");
    let mut command = Command::cargo_bin("msync").expect("msync binary is built");

    command
        .env("MSYNC_RSYNC", fake.binary())
        .env_remove("MSYNC_LOG")
        .args(["-q", "--random-delay", "0", "--temporary-directory"])
        .arg(&nested)
        .arg(U1)
        .arg(&workspace.dest)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("lies inside destination"));

    assert!(fake.invocations().expect("log").is_empty());
    assert!(!workspace.dest.exists());
}

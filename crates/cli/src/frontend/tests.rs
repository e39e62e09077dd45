use super::*;

fn run_with_args(args: &[&str]) -> (i32, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(args.iter().copied(), &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8(stdout).expect("utf8 stdout"),
        String::from_utf8(stderr).expect("utf8 stderr"),
    )
}

#[test]
fn help_goes_to_stdout() {
    let (code, stdout, stderr) = run_with_args(&["msync", "--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("SOURCE... DEST"));
    assert!(stderr.is_empty());
}

#[test]
fn version_reports_package_version() {
    let (code, stdout, _) = run_with_args(&["msync", "-V"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, format!("msync {VERSION}\n"));
}

#[test]
fn parse_errors_exit_with_syntax_code() {
    let (code, stdout, stderr) = run_with_args(&["msync", "--no-such-flag"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("msync error: "));
    assert!(stderr.trim_end().ends_with("(code 1)"));
}

#[test]
fn marker_sync_without_url_fails_before_locking() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let dest = scratch.path().join("mirror");
    let scratch_arg = scratch.path().to_str().expect("utf8 path");
    let dest_arg = dest.to_str().expect("utf8 path");

    let (code, _, stderr) = run_with_args(&[
        "msync",
        "--last-update-sync",
        "/dists/",
        "--temporary-directory",
        scratch_arg,
        "--id",
        "marker-check",
        "rsync://a/m/",
        dest_arg,
    ]);

    assert_eq!(code, 1);
    assert_eq!(
        stderr,
        "msync error: --last-update-sync requires --last-update-url (code 1)\n"
    );
    assert!(!scratch.path().join("msync-marker-check.lck").exists());
    assert!(!dest.exists());
}

#[test]
fn missing_operands_are_reported() {
    let (code, _, stderr) = run_with_args(&["msync", "/srv/mirror"]);
    assert_eq!(code, 1);
    assert_eq!(stderr, "msync error: at least one source is required (code 1)\n");
}

#[test]
fn exit_codes_are_clamped() {
    assert_eq!(clamp_status(0), 0);
    assert_eq!(clamp_status(-4), 0);
    assert_eq!(clamp_status(300), 255);
    assert_eq!(clamp_status(23), 23);
}

#[test]
fn scratch_inside_destination_fails_before_locking() {
    let root = tempfile::tempdir().expect("tempdir");
    let dest = root.path().join("mirror");
    let dest_arg = dest.to_str().expect("utf8 path");

    let (code, _, stderr) = run_with_args(&[
        "msync",
        "--temporary-directory",
        dest_arg,
        "--id",
        "nested",
        "rsync://a/m/",
        dest_arg,
    ]);

    assert_eq!(code, 1);
    assert!(stderr.starts_with("msync error: scratch directory "));
    assert!(stderr.contains("lies inside destination"));
    assert!(stderr.ends_with("(code 1)\n"));
    assert!(!dest.exists());
}

#[cfg(unix)]
#[test]
fn non_utf8_source_is_a_request_error() {
    use std::os::unix::ffi::OsStringExt;

    let root = tempfile::tempdir().expect("tempdir");
    let args = vec![
        OsString::from("msync"),
        OsString::from("--temporary-directory"),
        root.path().as_os_str().to_owned(),
        OsString::from_vec(b"rsync://a/\xff/".to_vec()),
        root.path().join("mirror").into_os_string(),
    ];
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let code = run(args, &mut stdout, &mut stderr);

    assert_eq!(code, 1);
    let stderr = String::from_utf8(stderr).expect("utf8 stderr");
    assert!(stderr.starts_with("msync error: source rsync://a/"));
    assert!(stderr.ends_with("is not valid UTF-8 (code 1)\n"));
    assert!(!root.path().join("mirror").exists());
}

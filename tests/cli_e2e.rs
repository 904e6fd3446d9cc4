//! End-to-end CLI tests for the dsputils binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary command isolated from any user config file.
fn dsputils(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dsputils").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG")
        .env_remove("COLAB_RELEASE_TAG");
    cmd
}

/// Test that the binary can be invoked without jobs and exits with code 0.
#[test]
fn test_binary_without_jobs_returns_zero() {
    let config = TempDir::new().unwrap();
    dsputils(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No jobs provided"));
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let config = TempDir::new().unwrap();
    dsputils(&config)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download a list of files concurrently"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let config = TempDir::new().unwrap();
    dsputils(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dsputils"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let config = TempDir::new().unwrap();
    dsputils(&config)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that an out-of-range concurrency is rejected by the parser.
#[test]
fn test_binary_rejects_zero_concurrency() {
    let config = TempDir::new().unwrap();
    dsputils(&config).args(["-c", "0"]).assert().failure();
}

/// Test that a broken config file is reported and fails the run.
#[test]
fn test_binary_invalid_config_file_fails() {
    let config = TempDir::new().unwrap();
    let dir = config.path().join("dsputils");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "concurrency = 0\n").unwrap();

    dsputils(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

/// Failed downloads are counted, not fatal: the run still exits with code 0.
#[test]
fn test_binary_unreachable_job_is_logged_and_exits_zero() {
    let config = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    dsputils(&config)
        .args(["--no-progress", "-t", "2", "-o"])
        .arg(out.path())
        .arg("http://127.0.0.1:1/file.bin")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download complete"));

    let log = std::fs::read_to_string(out.path().join("logs.txt")).unwrap();
    assert!(log.contains("ERROR - [Invalid URL]"));
    assert!(log.contains("URL: http://127.0.0.1:1/file.bin"));
}

/// Jobs can be read from a file with comments and blank lines.
#[test]
fn test_binary_reads_jobs_from_input_file() {
    let config = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = out.path().join("jobs.txt");
    std::fs::write(
        &input,
        "# jobs\n\nhttp://127.0.0.1:1/a.bin\nhttp://127.0.0.1:1/b.bin, b.bin\n",
    )
    .unwrap();

    dsputils(&config)
        .args(["--no-progress", "-t", "2", "-c", "2", "-o"])
        .arg(out.path())
        .arg("--input")
        .arg(&input)
        .assert()
        .success();

    let log = std::fs::read_to_string(out.path().join("logs.txt")).unwrap();
    assert_eq!(log.matches("[Invalid URL]").count(), 2);
}

/// Jobs can be piped through stdin.
#[test]
fn test_binary_reads_jobs_from_stdin() {
    let config = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    dsputils(&config)
        .args(["--no-progress", "-t", "2", "-o"])
        .arg(out.path())
        .write_stdin("http://127.0.0.1:1/piped.bin\n")
        .assert()
        .success();

    let log = std::fs::read_to_string(out.path().join("logs.txt")).unwrap();
    assert!(log.contains("piped.bin"));
}

//! Integration tests for the downsize CLI

use assert_cmd::Command;
use image::{DynamicImage, GenericImageView};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_image(root: &Path, relative: &str, width: u32, height: u32) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    DynamicImage::new_rgb8(width, height).save(path).unwrap();
}

/// Command running inside `temp` so no stray downsize.toml is picked up
fn downsize(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("downsize").unwrap();
    cmd.current_dir(temp.path())
        .env_remove("RUST_LOG")
        .env_remove("DOWNSIZE_MAX_WIDTH")
        .env_remove("DOWNSIZE_MAX_WORKERS");
    cmd
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    let temp = TempDir::new().unwrap();
    downsize(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--threads"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    let temp = TempDir::new().unwrap();
    downsize(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("downsize"));
}

#[test]
fn test_missing_source_is_config_error() {
    let temp = TempDir::new().unwrap();
    downsize(&temp)
        .args(["--dest", "out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("source path must be specified"));
    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_zero_threads_rejected_before_work() {
    let temp = TempDir::new().unwrap();
    write_image(&temp.path().join("in"), "a.png", 10, 10);

    downsize(&temp)
        .args(["--source", "in", "--dest", "out", "--threads", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("max workers must be a positive integer"));
    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_zero_width_rejected() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("in")).unwrap();

    downsize(&temp)
        .args(["-s", "in", "-d", "out", "-w", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("max width must be a positive integer"));
}

#[test]
fn test_resize_scenario_output_lines() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    write_image(&source, "img1.jpg", 3000, 300);
    write_image(&source, "img2.png", 800, 600);

    downsize(&temp)
        .args(["--source", "in", "--dest", "out", "--width", "1600"])
        .assert()
        .success()
        .stdout(predicate::str::contains("resized: img1.jpg"))
        .stdout(predicate::str::contains("not resized: img2.png"));

    let img1 = image::open(temp.path().join("out/img1.jpg")).unwrap();
    let img2 = image::open(temp.path().join("out/img2.png")).unwrap();
    assert_eq!(img1.dimensions(), (1600, 160));
    assert_eq!(img2.dimensions(), (800, 600));
}

/// Per-file failures are reported but do not change the exit status
#[test]
fn test_file_failure_keeps_exit_code_zero() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    write_image(&source, "good.png", 10, 10);
    fs::write(source.join("broken.jpg"), b"garbage").unwrap();

    downsize(&temp)
        .args(["-s", "in", "-d", "out", "-t", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not resized: good.png"))
        .stderr(predicate::str::contains("error: broken.jpg: open/decode error"));

    assert!(temp.path().join("out/good.png").is_file());
}

#[test]
fn test_fail_on_error_flag() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("in");
    write_image(&source, "good.png", 10, 10);
    fs::write(source.join("broken.jpg"), b"garbage").unwrap();

    downsize(&temp)
        .args(["-s", "in", "-d", "out", "--fail-on-error"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 of 2 files failed"));

    // The good file is still written
    assert!(temp.path().join("out/good.png").is_file());
}

#[test]
fn test_unreadable_source_fails_run() {
    let temp = TempDir::new().unwrap();
    downsize(&temp)
        .args(["-s", "missing", "-d", "out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("walk error"));
}

#[test]
fn test_quiet_suppresses_success_lines() {
    let temp = TempDir::new().unwrap();
    write_image(&temp.path().join("in"), "a.png", 10, 10);

    downsize(&temp)
        .args(["-s", "in", "-d", "out", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(temp.path().join("out/a.png").is_file());
}

#[test]
fn test_config_file_and_env_layers() {
    let temp = TempDir::new().unwrap();
    write_image(&temp.path().join("in"), "a.png", 400, 200);
    fs::write(
        temp.path().join("downsize.toml"),
        "source = \"in\"\ndest = \"out\"\nmax_width = 300\n",
    )
    .unwrap();

    // Local config file alone
    downsize(&temp).assert().success();
    let out = image::open(temp.path().join("out/a.png")).unwrap();
    assert_eq!(out.dimensions(), (300, 150));

    // Environment beats the file
    fs::remove_dir_all(temp.path().join("out")).unwrap();
    downsize(&temp)
        .env("DOWNSIZE_MAX_WIDTH", "200")
        .assert()
        .success();
    let out = image::open(temp.path().join("out/a.png")).unwrap();
    assert_eq!(out.dimensions(), (200, 100));

    // Flags beat the environment
    fs::remove_dir_all(temp.path().join("out")).unwrap();
    downsize(&temp)
        .env("DOWNSIZE_MAX_WIDTH", "200")
        .args(["--width", "100"])
        .assert()
        .success();
    let out = image::open(temp.path().join("out/a.png")).unwrap();
    assert_eq!(out.dimensions(), (100, 50));
}

#[test]
fn test_custom_config_file() {
    let temp = TempDir::new().unwrap();
    write_image(&temp.path().join("in"), "a.png", 400, 200);
    fs::write(temp.path().join("custom.toml"), "max_width = 40\n").unwrap();

    downsize(&temp)
        .args(["-s", "in", "-d", "out", "--config", "custom.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("resized: a.png"));
    let out = image::open(temp.path().join("out/a.png")).unwrap();
    assert_eq!(out.dimensions(), (40, 20));

    downsize(&temp)
        .args(["-s", "in", "-d", "out", "--config", "absent.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_verbose_prints_summary() {
    let temp = TempDir::new().unwrap();
    write_image(&temp.path().join("in"), "a.png", 10, 10);

    downsize(&temp)
        .args(["-s", "in", "-d", "out", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary"))
        .stdout(predicate::str::contains("Unchanged"));
}

//! Configuration file and environment handling of the binary.

use super::armlink;
use armlink::test_utils::{file_uri, write_template};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_invalid_config_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = write_template(temp.path(), "armlink.toml", "dedupe_concurrent_opens = [");
    let child = write_template(temp.path(), "child.json", "{}");

    armlink(temp.path())
        .args(["-q", "--config"])
        .arg(&config)
        .arg("params")
        .arg(&child)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = write_template(temp.path(), "armlink.toml", "cache_dir = \"/tmp\"\n");
    let child = write_template(temp.path(), "child.json", "{}");

    armlink(temp.path())
        .args(["-q", "--config"])
        .arg(&config)
        .arg("params")
        .arg(&child)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache_dir"));
}

#[test]
fn test_valid_config_file_is_used() {
    let temp = TempDir::new().unwrap();
    let config = write_template(
        temp.path(),
        "armlink.toml",
        "dedupe_concurrent_opens = false\nopen_timeout_ms = 30000\n",
    );
    let main = write_template(temp.path(), "main.json", "{}");
    let child = write_template(temp.path(), "child.json", "{}");

    armlink(temp.path())
        .args(["-q", "--config"])
        .arg(&config)
        .args(["open", &file_uri(&main), &file_uri(&child)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opened"));
}

#[test]
fn test_invalid_environment_override() {
    let temp = TempDir::new().unwrap();
    let child = write_template(temp.path(), "child.json", "{}");

    armlink(temp.path())
        .env("ARMLINK_DEDUPE_OPENS", "sometimes")
        .args(["-q", "params"])
        .arg(&child)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ARMLINK_DEDUPE_OPENS"))
        .stderr(predicate::str::contains("ARMLINK_* environment variables"));
}

#[test]
fn test_invalid_timeout_override() {
    let temp = TempDir::new().unwrap();
    let child = write_template(temp.path(), "child.json", "{}");

    armlink(temp.path())
        .env("ARMLINK_OPEN_TIMEOUT_MS", "soon")
        .args(["-q", "params"])
        .arg(&child)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a number of milliseconds"));
}

#[cfg(unix)]
#[test]
fn test_default_config_comes_from_home() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join(".armlink");
    std::fs::create_dir_all(&config_dir).unwrap();
    write_template(&config_dir, "config.toml", "discard_stale_snapshots = \"maybe\"\n");
    let child = write_template(temp.path(), "child.json", "{}");

    armlink(temp.path())
        .args(["-q", "params"])
        .arg(&child)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"))
        .stderr(predicate::str::contains(".armlink"));
}

#[test]
fn test_missing_default_config_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let child = write_template(temp.path(), "child.json", "{}");

    armlink(temp.path())
        .args(["-q", "params"])
        .arg(&child)
        .assert()
        .success();
}

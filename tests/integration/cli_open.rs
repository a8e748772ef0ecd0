//! `armlink open` end to end.

use super::armlink;
use armlink::test_utils::{file_uri, write_template};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_open_existing_template() {
    let temp = TempDir::new().unwrap();
    let main = write_template(temp.path(), "main.json", "{}");
    let child = write_template(temp.path(), "child.json", r#"{ "resources": [] }"#);

    armlink(temp.path())
        .args(["-q", "open", &file_uri(&main), &file_uri(&child)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opened linked template file"));
}

#[test]
fn test_open_missing_template_reports_not_found() {
    let temp = TempDir::new().unwrap();
    let main = write_template(temp.path(), "main.json", "{}");
    let missing = temp.path().join("missing.json");

    armlink(temp.path())
        .args(["-q", "open", &file_uri(&main), &file_uri(&missing)])
        .args(["--kind", "template-relative-link", "--original", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find linked template file"))
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn test_open_missing_parameter_file_json_response() {
    let temp = TempDir::new().unwrap();
    let main = write_template(temp.path(), "main.json", "{}");
    let missing = temp.path().join("main.parameters.json");

    let output = armlink(temp.path())
        .args(["-q", "open", &file_uri(&main), &file_uri(&missing)])
        .args(["--kind", "parameters-link", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let message = response["loadErrorMessage"].as_str().unwrap();
    assert!(message.starts_with("Could not find linked parameter file"), "{message}");
}

#[test]
fn test_open_accepts_local_paths() {
    let temp = TempDir::new().unwrap();
    write_template(temp.path(), "main.json", "{}");
    write_template(temp.path(), "child.json", "{}");

    armlink(temp.path())
        .current_dir(temp.path())
        .args(["-q", "open", "main.json", "child.json", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{}"));
}

#[test]
fn test_open_commented_and_unfinished_templates() {
    let temp = TempDir::new().unwrap();
    let main = write_template(temp.path(), "main.json", "{}");
    let commented = write_template(
        temp.path(),
        "commented.json",
        "{\n  // storage account\n  \"resources\": [ /* none yet */ ]\n}",
    );
    let unfinished = write_template(temp.path(), "unfinished.json", "{ \"resources\": [ ");

    for child in [&commented, &unfinished] {
        armlink(temp.path())
            .args(["-q", "open", &file_uri(&main), &file_uri(child)])
            .assert()
            .success()
            .stdout(predicate::str::contains("Opened linked template file"));
    }
}

#[test]
fn test_open_undecodable_template_reports_open_failed() {
    let temp = TempDir::new().unwrap();
    let main = write_template(temp.path(), "main.json", "{}");
    let binary = temp.path().join("binary.json");
    std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x7b]).unwrap();

    armlink(temp.path())
        .args(["-q", "open", &file_uri(&main), &file_uri(&binary)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load linked template file"));
}

#[test]
fn test_open_remote_uri_is_unsupported() {
    let temp = TempDir::new().unwrap();
    let main = write_template(temp.path(), "main.json", "{}");

    armlink(temp.path())
        .args(["-q", "open", &file_uri(&main), "https://example.com/child.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scheme 'https'"));
}

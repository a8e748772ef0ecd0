//! `armlink sync` end to end.

use super::armlink;
use armlink::test_utils::{LinkFixture, file_uri, write_template};
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

struct SyncInputs {
    tree: PathBuf,
    notification: PathBuf,
    reference_id: String,
}

fn write_inputs(dir: &Path, root_uri: &str, notified_root: &str) -> SyncInputs {
    let fixture = LinkFixture::new("child.json");
    let child = dir.join("child.json");
    let reference_id = Uuid::new_v4().to_string();

    let tree = json!({
        "documentUri": root_uri,
        "text": fixture.text,
        "scopes": [
            {
                "kind": "linkedDeployment",
                "name": "child",
                "span": { "start": fixture.resource_span.start, "length": fixture.resource_span.length }
            }
        ]
    });
    let notification = json!({
        "rootTemplateUri": notified_root,
        "linkedTemplates": [
            {
                "id": reference_id,
                "fullUri": file_uri(&child),
                "originalPath": "child.json",
                "lineNumberInParent": fixture.link_position.line,
                "columnNumberInParent": fixture.link_position.column,
                "loadState": 2
            },
            {
                "id": Uuid::new_v4().to_string(),
                "fullUri": file_uri(&dir.join("elsewhere.json")),
                "lineNumberInParent": 0,
                "columnNumberInParent": 0
            }
        ]
    });

    SyncInputs {
        tree: write_template(dir, "tree.json", &tree.to_string()),
        notification: write_template(dir, "graph.json", &notification.to_string()),
        reference_id,
    }
}

#[test]
fn test_sync_attaches_reference_to_link_site() {
    let temp = TempDir::new().unwrap();
    let root = file_uri(&temp.path().join("main.json"));
    let inputs = write_inputs(temp.path(), &root, &root);

    let output = armlink(temp.path())
        .args(["-q", "sync", "--json", "--tree"])
        .arg(&inputs.tree)
        .arg("--notification")
        .arg(&inputs.notification)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let summary: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["report"]["candidateScopes"], 1);
    assert_eq!(summary["report"]["attached"], 1);
    assert_eq!(summary["report"]["dropped"], 1);

    let linked = summary["scopes"][0]["linkedTemplates"].as_array().unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["id"], inputs.reference_id.as_str());
    assert_eq!(linked[0]["loadState"], 2);
}

#[test]
fn test_sync_text_output() {
    let temp = TempDir::new().unwrap();
    let root = file_uri(&temp.path().join("main.json"));
    let inputs = write_inputs(temp.path(), &root, &root);

    armlink(temp.path())
        .args(["-q", "sync", "--tree"])
        .arg(&inputs.tree)
        .arg("--notification")
        .arg(&inputs.notification)
        .assert()
        .success()
        .stdout(predicate::str::contains(inputs.reference_id.as_str()))
        .stdout(predicate::str::contains("SuccessfullyLoaded"))
        .stdout(predicate::str::contains("Attached 1, dropped 1 across 1 template link(s)"));
}

#[test]
fn test_sync_for_another_document_fails() {
    let temp = TempDir::new().unwrap();
    let root = file_uri(&temp.path().join("main.json"));
    let other = file_uri(&temp.path().join("other.json"));
    let inputs = write_inputs(temp.path(), &root, &other);

    armlink(temp.path())
        .args(["-q", "sync", "--tree"])
        .arg(&inputs.tree)
        .arg("--notification")
        .arg(&inputs.notification)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No scope tree is registered"))
        .stderr(predicate::str::contains("other.json"));
}

#[test]
fn test_sync_rejects_malformed_notification() {
    let temp = TempDir::new().unwrap();
    let root = file_uri(&temp.path().join("main.json"));
    let inputs = write_inputs(temp.path(), &root, &root);
    let broken = write_template(temp.path(), "broken.json", r#"{ "rootTemplateUri": 5 }"#);

    armlink(temp.path())
        .args(["-q", "sync", "--tree"])
        .arg(&inputs.tree)
        .arg("--notification")
        .arg(&broken)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid notification"));
}

#[test]
fn test_sync_rejects_overlapping_scopes() {
    let temp = TempDir::new().unwrap();
    let root = file_uri(&temp.path().join("main.json"));
    let tree = json!({
        "documentUri": root,
        "text": " ".repeat(100),
        "scopes": [
            { "kind": "linkedDeployment", "span": { "start": 10, "length": 30 } },
            { "kind": "linkedDeployment", "span": { "start": 20, "length": 30 } }
        ]
    });
    let tree = write_template(temp.path(), "tree.json", &tree.to_string());
    let notification = json!({ "rootTemplateUri": root, "linkedTemplates": [] });
    let notification = write_template(temp.path(), "graph.json", &notification.to_string());

    armlink(temp.path())
        .args(["-q", "sync", "--tree"])
        .arg(&tree)
        .arg("--notification")
        .arg(&notification)
        .assert()
        .failure()
        .stderr(predicate::str::contains("suggestion"));
}

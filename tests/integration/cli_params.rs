//! `armlink params` end to end.

use super::armlink;
use armlink::test_utils::write_template;
use predicates::prelude::*;
use tempfile::TempDir;

const CHILD: &str = r#"{
  "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
  "parameters": {
    "storageName": {
      "type": "string",
      "metadata": { "description": "Name of the storage account" }
    },
    "sku": { "type": "string", "defaultValue": "Standard_LRS" }
  },
  "resources": []
}"#;

#[test]
fn test_params_lists_definitions() {
    let temp = TempDir::new().unwrap();
    let child = write_template(temp.path(), "child.json", CHILD);

    armlink(temp.path())
        .args(["-q", "params"])
        .arg(&child)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 parameters"))
        .stdout(predicate::str::contains("storageName"))
        .stdout(predicate::str::contains("Name of the storage account"))
        .stdout(predicate::str::contains("required"));
}

#[test]
fn test_params_json_output() {
    let temp = TempDir::new().unwrap();
    let child = write_template(temp.path(), "child.json", CHILD);

    let output = armlink(temp.path())
        .args(["-q", "params", "--json"])
        .arg(&child)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let definitions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let definitions = definitions.as_array().unwrap();
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[0]["name"], "sku");
    assert_eq!(definitions[0]["defaultValue"], "Standard_LRS");
    assert_eq!(definitions[1]["type"], "string");
}

#[test]
fn test_params_template_without_parameters() {
    let temp = TempDir::new().unwrap();
    let child = write_template(temp.path(), "child.json", r#"{ "resources": [] }"#);

    armlink(temp.path())
        .args(["-q", "params"])
        .arg(&child)
        .assert()
        .success()
        .stdout(predicate::str::contains("No parameters declared"));
}

#[test]
fn test_params_missing_template() {
    let temp = TempDir::new().unwrap();

    armlink(temp.path())
        .args(["-q", "params"])
        .arg(temp.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find linked template file"))
        .stderr(predicate::str::contains("suggestion"));
}

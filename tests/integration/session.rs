//! A session driven through a full open/notify/complete cycle.

use armlink::config::LinkConfig;
use armlink::document::DocumentStore;
use armlink::graph::{NotifyTemplateGraphArgs, SyncOutcome};
use armlink::links::{LoadState, ReferenceKind};
use armlink::resolver::OpenLinkedFileRequest;
use armlink::scope::{ScopeKind, ScopeTree};
use armlink::session::LinkSession;
use armlink::test_utils::{LinkFixture, file_uri, init_test_logging, write_template};
use armlink::uri::NormalizedUri;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CHILD: &str = r#"{
  "parameters": {
    "storageName": { "type": "string" },
    "sku": { "type": "string", "defaultValue": "Standard_LRS" }
  },
  "resources": []
}"#;

fn open_request(dir: &Path, target: &str, kind: ReferenceKind) -> OpenLinkedFileRequest {
    OpenLinkedFileRequest {
        source_document_uri: file_uri(&dir.join("main.json")),
        requested_link_original_uri: target.to_string(),
        requested_link_resolved_uri: file_uri(&dir.join(target)),
        reference_kind: kind,
    }
}

fn register_main(session: &LinkSession, dir: &Path, fixture: &LinkFixture) -> NormalizedUri {
    let uri = NormalizedUri::from_file_path(&dir.join("main.json")).unwrap();
    let mut tree = ScopeTree::new(uri.clone(), &fixture.text);
    let root = tree.root_id();
    tree.add_scope(root, ScopeKind::LinkedDeployment, fixture.resource_span, Some("child"))
        .unwrap();
    session.register_scope_tree(tree);
    uri
}

#[tokio::test]
async fn test_open_notify_and_complete_parameters() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let fixture = LinkFixture::new("child.json");
    write_template(temp.path(), "main.json", &fixture.text);
    let child = write_template(temp.path(), "child.json", CHILD);

    let session = LinkSession::new(LinkConfig::default());
    let root = register_main(&session, temp.path(), &fixture);

    let response = session
        .on_request_open_linked_file(&open_request(
            temp.path(),
            "child.json",
            ReferenceKind::TemplateRelativeLink,
        ))
        .await;
    assert!(response.is_loaded(), "{response:?}");

    let args: NotifyTemplateGraphArgs = serde_json::from_value(json!({
        "rootTemplateUri": root.as_str(),
        "linkedTemplates": [{
            "id": "child-link",
            "fullUri": file_uri(&child),
            "originalPath": "child.json",
            "lineNumberInParent": fixture.link_position.line,
            "columnNumberInParent": fixture.link_position.column,
            "loadState": 2
        }]
    }))
    .unwrap();

    let outcome = session.on_notify_template_graph(args).unwrap();
    assert!(matches!(outcome, SyncOutcome::Applied(report) if report.attached == 1 && report.dropped == 0));

    // Completion at the link site: find the reference through the tree
    let tree = session.scope_tree(&root).unwrap();
    let tree = tree.read().unwrap();
    let scope = tree.innermost_scope_at(fixture.link_offset());
    let references = tree.scope(scope).linked_file_references();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].load_state(), &LoadState::SuccessfullyLoaded);

    let mut names: Vec<_> = session
        .parameter_definitions_for(&references[0])
        .into_iter()
        .map(|definition| definition.name)
        .collect();
    names.sort();
    assert_eq!(names, ["sku", "storageName"]);
}

#[tokio::test]
async fn test_failed_open_is_reported_on_the_reference() {
    let temp = TempDir::new().unwrap();
    let fixture = LinkFixture::new("missing.json");
    let session = LinkSession::new(LinkConfig::default());
    let root = register_main(&session, temp.path(), &fixture);

    let response = session
        .on_request_open_linked_file(&open_request(
            temp.path(),
            "missing.json",
            ReferenceKind::TemplateRelativeLink,
        ))
        .await;
    let message = response.load_error_message.unwrap();
    assert!(message.starts_with("Could not find linked template file"));

    let args: NotifyTemplateGraphArgs = serde_json::from_value(json!({
        "rootTemplateUri": root.as_str(),
        "linkedTemplates": [{
            "id": "missing-link",
            "fullUri": file_uri(&temp.path().join("missing.json")),
            "lineNumberInParent": fixture.link_position.line,
            "columnNumberInParent": fixture.link_position.column,
            "loadState": 3,
            "loadErrorMessage": &message
        }]
    }))
    .unwrap();
    session.on_notify_template_graph(args).unwrap();

    let tree = session.scope_tree(&root).unwrap();
    let tree = tree.read().unwrap();
    let (_, reference) = tree.all_linked_references().next().unwrap();
    assert_eq!(reference.load_error_message(), Some(message.as_str()));
    assert!(session.parameter_definitions_for(reference).is_empty());
}

#[tokio::test]
async fn test_later_notification_replaces_earlier_references() {
    let temp = TempDir::new().unwrap();
    let fixture = LinkFixture::new("child.json");
    let session = LinkSession::new(LinkConfig::default());
    let root = register_main(&session, temp.path(), &fixture);

    let notify = |id: &str| {
        let args: NotifyTemplateGraphArgs = serde_json::from_value(json!({
            "rootTemplateUri": root.as_str(),
            "linkedTemplates": [{
                "id": id,
                "fullUri": file_uri(&temp.path().join("child.json")),
                "lineNumberInParent": fixture.link_position.line,
                "columnNumberInParent": fixture.link_position.column
            }]
        }))
        .unwrap();
        session.on_notify_template_graph(args).unwrap()
    };

    assert!(matches!(notify("first"), SyncOutcome::Applied(_)));
    assert!(matches!(notify("second"), SyncOutcome::Applied(_)));

    let tree = session.scope_tree(&root).unwrap();
    let tree = tree.read().unwrap();
    let ids: Vec<_> = tree.all_linked_references().map(|(_, r)| r.id.clone()).collect();
    assert_eq!(ids, ["second"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opens_share_one_load() {
    let temp = TempDir::new().unwrap();
    write_template(temp.path(), "child.json", CHILD);
    let session = Arc::new(LinkSession::new(LinkConfig::default()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let session = Arc::clone(&session);
        let request = open_request(temp.path(), "child.json", ReferenceKind::TemplateLink);
        handles.push(tokio::spawn(async move {
            session.on_request_open_linked_file(&request).await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_loaded());
    }
    assert_eq!(session.store().cache().len(), 1);
}

//! The NotifyTemplateGraph payload and the snapshot built from it.

use crate::links::LinkedTemplateReference;
use crate::uri::{NormalizedUri, UriError};
use serde::{Deserialize, Serialize};

/// Notification sent by the analysis process whenever it finishes walking the
/// linked templates of a root document.
///
/// ```json
/// {
///   "rootTemplateUri": "file:///templates/main.json",
///   "linkedTemplates": [
///     {
///       "id": "5a1c...",
///       "fullUri": "file:///templates/child.json",
///       "lineNumberInParent": 12,
///       "columnNumberInParent": 8,
///       "parameterValues": {},
///       "loadState": 2
///     }
///   ],
///   "fullValidationEnabled": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyTemplateGraphArgs {
    /// The root template the graph belongs to
    pub root_template_uri: String,
    /// Every reference reachable from the root, flattened
    #[serde(default)]
    pub linked_templates: Vec<LinkedTemplateReference>,
    /// Whether the analysis process validated the linked templates fully
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_validation_enabled: Option<bool>,
}

/// One complete, authoritative view of a root document's linked references.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateGraphSnapshot {
    /// Normalized root document URI
    pub root_uri: NormalizedUri,
    /// References in notification order
    pub references: Vec<LinkedTemplateReference>,
    /// Per-root receipt order, starting at 1
    pub sequence: u64,
    /// Echo of `fullValidationEnabled`, `false` when absent
    pub full_validation_enabled: bool,
}

impl TemplateGraphSnapshot {
    /// Build a snapshot directly, outside the notification path.
    #[must_use]
    pub fn new(root_uri: NormalizedUri, references: Vec<LinkedTemplateReference>, sequence: u64) -> Self {
        Self {
            root_uri,
            references,
            sequence,
            full_validation_enabled: false,
        }
    }

    /// Build a snapshot from a notification.
    ///
    /// # Errors
    ///
    /// Fails when `rootTemplateUri` is not an absolute URI.
    pub fn from_notification(args: NotifyTemplateGraphArgs, sequence: u64) -> Result<Self, UriError> {
        Ok(Self {
            root_uri: NormalizedUri::parse(&args.root_template_uri)?,
            references: args.linked_templates,
            sequence,
            full_validation_enabled: args.full_validation_enabled.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::LoadState;
    use serde_json::json;

    #[test]
    fn test_notification_from_wire() {
        let args: NotifyTemplateGraphArgs = serde_json::from_value(json!({
            "rootTemplateUri": "file:///t/main.json",
            "linkedTemplates": [
                {
                    "id": "a",
                    "fullUri": "file:///t/child.json",
                    "lineNumberInParent": 2,
                    "columnNumberInParent": 4,
                    "loadState": 3,
                    "loadErrorMessage": "Could not find linked template file \"/t/child.json\""
                }
            ]
        }))
        .unwrap();

        let snapshot = TemplateGraphSnapshot::from_notification(args, 7).unwrap();
        assert_eq!(snapshot.sequence, 7);
        assert!(!snapshot.full_validation_enabled);
        assert_eq!(snapshot.references.len(), 1);
        assert!(matches!(
            snapshot.references[0].load_state(),
            LoadState::LoadFailed { .. }
        ));
    }

    #[test]
    fn test_notification_rejects_inconsistent_reference() {
        let result: Result<NotifyTemplateGraphArgs, _> = serde_json::from_value(json!({
            "rootTemplateUri": "file:///t/main.json",
            "linkedTemplates": [
                {
                    "id": "a",
                    "fullUri": "file:///t/child.json",
                    "lineNumberInParent": 0,
                    "columnNumberInParent": 0,
                    "loadState": 2,
                    "loadErrorMessage": "stray"
                }
            ]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_relative_root_is_rejected() {
        let args = NotifyTemplateGraphArgs {
            root_template_uri: "main.json".to_string(),
            linked_templates: vec![],
            full_validation_enabled: Some(true),
        };
        assert!(TemplateGraphSnapshot::from_notification(args, 1).is_err());
    }
}

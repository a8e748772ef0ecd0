//! Wire types of the OpenLinkedFile request.

use crate::links::ReferenceKind;
use serde::{Deserialize, Serialize};

/// Request from the analysis process to open a linked file.
///
/// ```json
/// {
///   "sourceDocumentUri": "file:///templates/main.json",
///   "requestedLinkOriginalUri": "child.json",
///   "requestedLinkResolvedUri": "file:///templates/child.json",
///   "referenceKind": "templateRelativeLink"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLinkedFileRequest {
    /// Document containing the link site
    pub source_document_uri: String,
    /// Link target as authored
    pub requested_link_original_uri: String,
    /// Link target resolved to an absolute URI
    pub requested_link_resolved_uri: String,
    /// Kind of link site
    #[serde(default)]
    pub reference_kind: ReferenceKind,
}

/// Reply to an [`OpenLinkedFileRequest`]. An absent message means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLinkedFileResponse {
    /// Human-readable reason the file could not be opened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_error_message: Option<String>,
}

impl OpenLinkedFileResponse {
    /// A successful response.
    #[must_use]
    pub fn loaded() -> Self {
        Self::default()
    }

    /// A failed response carrying `message`.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            load_error_message: Some(message.into()),
        }
    }

    /// Whether the file was opened.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.load_error_message.is_none()
    }
}

//! Serialized form of a scope tree.
//!
//! Template parsers running out of process (and the `armlink sync` command)
//! hand scope trees over as JSON:
//!
//! ```json
//! {
//!   "documentUri": "file:///templates/main.json",
//!   "scopes": [
//!     { "kind": "linkedDeployment", "name": "child", "span": { "start": 100, "length": 200 } }
//!   ]
//! }
//! ```
//!
//! The top-level scope is implicit. The document text may be embedded as
//! `text`; otherwise the caller supplies it when building.

use super::{ScopeId, ScopeKind, ScopeTree, ScopeTreeError, Span};
use crate::uri::NormalizedUri;
use serde::{Deserialize, Serialize};

/// A scope tree as exchanged in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeTreeDefinition {
    /// URI of the document
    pub document_uri: String,
    /// Document text, if embedded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Scopes directly below the top-level scope
    #[serde(default)]
    pub scopes: Vec<ScopeDefinition>,
}

/// One scope and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeDefinition {
    /// Kind of scope
    pub kind: ScopeKind,
    /// Resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Span of the owning resource
    pub span: Span,
    /// Nested scopes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ScopeDefinition>,
}

impl ScopeTreeDefinition {
    /// Build the tree over the given document text.
    ///
    /// # Errors
    ///
    /// Fails when the document URI is not absolute or a scope violates the
    /// nesting rules checked by [`ScopeTree::add_scope`].
    pub fn build(&self, text: &str) -> Result<ScopeTree, ScopeTreeError> {
        let uri = NormalizedUri::parse(&self.document_uri)?;
        let mut tree = ScopeTree::new(uri, text);
        let root = tree.root_id();
        for scope in &self.scopes {
            add_recursive(&mut tree, root, scope)?;
        }
        Ok(tree)
    }

    /// Build the tree over the embedded `text`, or an empty document.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_embedded(&self) -> Result<ScopeTree, ScopeTreeError> {
        self.build(self.text.as_deref().unwrap_or_default())
    }
}

fn add_recursive(
    tree: &mut ScopeTree,
    parent: ScopeId,
    definition: &ScopeDefinition,
) -> Result<(), ScopeTreeError> {
    let id = tree.add_scope(parent, definition.kind, definition.span, definition.name.as_deref())?;
    for child in &definition.children {
        add_recursive(tree, id, child)?;
    }
    Ok(())
}

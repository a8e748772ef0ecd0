//! The scope tree of a parsed deployment template.
//!
//! A template decomposes into a top-level scope covering the whole document
//! and one nested scope per deployment resource (`Microsoft.Resources/deployments`).
//! Nested deployments with an inline `template` become
//! [`ScopeKind::NestedDeploymentWithInnerScope`] or
//! [`ScopeKind::NestedDeploymentWithOuterScope`]; deployments with a
//! `templateLink` become [`ScopeKind::LinkedDeployment`].
//!
//! Building the tree from template text is the job of the template parser,
//! which lives outside this crate. The parser (or a test) creates a
//! [`ScopeTree`] with [`ScopeTree::new`] and [`ScopeTree::add_scope`], or from
//! a serialized [`ScopeTreeDefinition`]. armlink then owns exactly one
//! mutable aspect of each scope: its list of attached linked template
//! references, rewritten by the [`graph`](crate::graph) synchronizer.
//!
//! # Examples
//!
//! ```rust
//! use armlink::scope::{ScopeKind, ScopeTree, Span};
//! use armlink::uri::NormalizedUri;
//!
//! let text = " ".repeat(400);
//! let uri = NormalizedUri::parse("file:///templates/main.json").unwrap();
//! let mut tree = ScopeTree::new(uri, &text);
//! let root = tree.root_id();
//! let link = tree
//!     .add_scope(root, ScopeKind::LinkedDeployment, Span::from_bounds(100, 300), Some("child"))
//!     .unwrap();
//!
//! assert_eq!(tree.linked_deployment_scopes(), vec![link]);
//! assert!(tree.scope(link).linked_file_references().is_empty());
//! ```

mod definition;
mod position;
mod span;

pub use definition::{ScopeDefinition, ScopeTreeDefinition};
pub use position::LineIndex;
pub use span::{Containment, Span};

use crate::links::LinkedTemplateReference;
use crate::uri::NormalizedUri;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of scope in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeKind {
    /// The document itself
    TopLevel,
    /// Inline nested template evaluated in its own scope
    NestedDeploymentWithInnerScope,
    /// Inline nested template evaluated in the parent's scope
    NestedDeploymentWithOuterScope,
    /// Deployment resource whose template comes from a `templateLink`
    LinkedDeployment,
}

impl ScopeKind {
    /// Whether scopes of this kind receive linked template references.
    #[must_use]
    pub fn is_link_site(self) -> bool {
        self == ScopeKind::LinkedDeployment
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::TopLevel => "top-level",
            ScopeKind::NestedDeploymentWithInnerScope => "nested (inner-scoped)",
            ScopeKind::NestedDeploymentWithOuterScope => "nested (outer-scoped)",
            ScopeKind::LinkedDeployment => "linked",
        };
        f.write_str(name)
    }
}

/// Index of a scope inside its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    /// Position of the scope in creation order; the root is 0.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Problems detected while assembling a scope tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeTreeError {
    /// The document URI is not an absolute URI
    #[error(transparent)]
    Uri(#[from] crate::uri::UriError),

    /// The parent id does not belong to this tree
    #[error("Unknown parent scope #{0}")]
    UnknownParent(usize),

    /// A child span reaches outside its parent's span
    #[error("Scope span {child} is not inside its parent span {parent}")]
    OutsideParent {
        /// The child's span
        child: Span,
        /// The parent's span
        parent: Span,
    },

    /// `start + length` does not fit in a character offset
    #[error("Scope span starting at {start} with length {length} overflows")]
    SpanOverflow {
        /// Start offset of the span
        start: usize,
        /// Its length
        length: usize,
    },

    /// Two scopes at the same level overlap
    #[error("Scope span {span} overlaps sibling span {sibling}")]
    OverlapsSibling {
        /// The new span
        span: Span,
        /// The sibling it collides with
        sibling: Span,
    },
}

/// One node of the scope tree.
#[derive(Debug, Clone)]
pub struct TemplateScope {
    id: ScopeId,
    kind: ScopeKind,
    name: Option<String>,
    span: Span,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    linked_references: Vec<LinkedTemplateReference>,
}

impl TemplateScope {
    /// Id of this scope.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Kind of this scope.
    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Resource name, when the parser knew it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Span of the resource that owns this scope (the whole document for the root).
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Parent scope; `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Direct children, in creation order.
    #[must_use]
    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    /// Linked template references attached by the last synchronization.
    #[must_use]
    pub fn linked_file_references(&self) -> &[LinkedTemplateReference] {
        &self.linked_references
    }
}

/// The scope tree of one document, plus the line index needed to map
/// `(line, column)` positions onto it.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    document_uri: NormalizedUri,
    line_index: LineIndex,
    scopes: Vec<TemplateScope>,
}

impl ScopeTree {
    /// Create a tree holding only the top-level scope, spanning all of `text`.
    #[must_use]
    pub fn new(document_uri: NormalizedUri, text: &str) -> Self {
        let line_index = LineIndex::new(text);
        let root = TemplateScope {
            id: ScopeId(0),
            kind: ScopeKind::TopLevel,
            name: None,
            span: Span::new(0, line_index.len()),
            parent: None,
            children: Vec::new(),
            linked_references: Vec::new(),
        };
        Self {
            document_uri,
            line_index,
            scopes: vec![root],
        }
    }

    /// Add a scope under `parent`.
    ///
    /// # Errors
    ///
    /// Rejects unknown parents, spans that leave the parent's span, and spans
    /// that overlap an existing sibling.
    pub fn add_scope(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        span: Span,
        name: Option<&str>,
    ) -> Result<ScopeId, ScopeTreeError> {
        let parent_scope = self
            .scopes
            .get(parent.0)
            .ok_or(ScopeTreeError::UnknownParent(parent.0))?;

        if span.checked_after_end().is_none() {
            return Err(ScopeTreeError::SpanOverflow {
                start: span.start,
                length: span.length,
            });
        }

        if !parent_scope.span.encloses(&span) {
            return Err(ScopeTreeError::OutsideParent {
                child: span,
                parent: parent_scope.span,
            });
        }

        if let Some(sibling) = parent_scope
            .children
            .iter()
            .map(|id| self.scopes[id.0].span)
            .find(|sibling| sibling.overlaps(&span))
        {
            return Err(ScopeTreeError::OverlapsSibling { span, sibling });
        }

        let id = ScopeId(self.scopes.len());
        self.scopes.push(TemplateScope {
            id,
            kind,
            name: name.map(str::to_string),
            span,
            parent: Some(parent),
            children: Vec::new(),
            linked_references: Vec::new(),
        });
        self.scopes[parent.0].children.push(id);
        Ok(id)
    }

    /// URI of the document this tree describes.
    #[must_use]
    pub fn document_uri(&self) -> &NormalizedUri {
        &self.document_uri
    }

    /// Line index of the document text.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Id of the top-level scope.
    #[must_use]
    pub fn root_id(&self) -> ScopeId {
        ScopeId(0)
    }

    /// The scope with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different tree.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &TemplateScope {
        &self.scopes[id.0]
    }

    /// All scopes, root first, in creation order.
    pub fn scopes(&self) -> impl Iterator<Item = &TemplateScope> {
        self.scopes.iter()
    }

    /// Ids of every scope that represents a template-link resource.
    #[must_use]
    pub fn linked_deployment_scopes(&self) -> Vec<ScopeId> {
        self.scopes
            .iter()
            .filter(|scope| scope.kind.is_link_site())
            .map(|scope| scope.id)
            .collect()
    }

    /// The innermost scope whose span strictly contains `offset`.
    #[must_use]
    pub fn innermost_scope_at(&self, offset: usize) -> ScopeId {
        let mut current = self.root_id();
        while let Some(child) = self.scopes[current.0]
            .children
            .iter()
            .copied()
            .find(|child| self.scopes[child.0].span.contains(offset, Containment::Strict))
        {
            current = child;
        }
        current
    }

    /// Every linked reference currently attached anywhere in the tree.
    pub fn all_linked_references(&self) -> impl Iterator<Item = (ScopeId, &LinkedTemplateReference)> {
        self.scopes.iter().flat_map(|scope| {
            scope
                .linked_references
                .iter()
                .map(move |reference| (scope.id, reference))
        })
    }

    pub(crate) fn clear_linked_references(&mut self, id: ScopeId) {
        self.scopes[id.0].linked_references.clear();
    }

    pub(crate) fn attach_linked_reference(&mut self, id: ScopeId, reference: LinkedTemplateReference) {
        self.scopes[id.0].linked_references.push(reference);
    }
}

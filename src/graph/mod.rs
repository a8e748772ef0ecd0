//! Synchronizing template graph notifications with scope trees.
//!
//! The analysis process walks the linked templates of a root document and
//! reports the result as one flat list of references, each carrying the
//! `(line, column)` of its link site in the root document. The language model
//! on this side holds a nested [`ScopeTree`](crate::scope::ScopeTree) for the
//! same document. The two views share no identifiers, so they are joined by
//! position: a reference belongs to the template-link resource whose span
//! strictly encloses its link site.
//!
//! Every notification is total for its root. Applying one clears the
//! references of every linked-deployment scope and attaches the new ones, so
//! nothing survives from an earlier notification unless the new one repeats
//! it. Applying the same snapshot twice yields the same attachments.
//!
//! Notifications may arrive out of order. Each one is numbered on receipt
//! ([`TemplateGraphSynchronizer::receive`]) and
//! [`TemplateGraphSynchronizer::apply`] discards a snapshot that is not newer
//! than the last one applied for its root.
//!
//! # Examples
//!
//! ```rust
//! use armlink::graph::{TemplateGraphSnapshot, TemplateGraphSynchronizer};
//! use armlink::links::{LinkedTemplateReference, SourcePosition};
//! use armlink::scope::{ScopeKind, ScopeTree, Span};
//! use armlink::uri::NormalizedUri;
//!
//! let uri = NormalizedUri::parse("file:///templates/main.json").unwrap();
//! let mut tree = ScopeTree::new(uri.clone(), &" ".repeat(400));
//! let root = tree.root_id();
//! let link = tree
//!     .add_scope(root, ScopeKind::LinkedDeployment, Span::from_bounds(100, 300), None)
//!     .unwrap();
//!
//! let reference =
//!     LinkedTemplateReference::new("a", "file:///templates/child.json", SourcePosition::new(0, 150));
//! let snapshot = TemplateGraphSnapshot::new(uri, vec![reference], 1);
//!
//! let report = TemplateGraphSynchronizer::synchronize(&snapshot, &mut tree);
//! assert_eq!(report.attached, 1);
//! assert_eq!(tree.scope(link).linked_file_references().len(), 1);
//! ```

mod notification;
mod synchronizer;


pub use notification::{NotifyTemplateGraphArgs, TemplateGraphSnapshot};
pub use synchronizer::{SyncReport, TemplateGraphSynchronizer};

/// What happened to a received snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The snapshot was applied to the root's scope tree
    Applied(SyncReport),
    /// A newer snapshot for the same root had already been applied
    Stale,
    /// No scope tree is registered for the root document
    NoScopeTree,
}

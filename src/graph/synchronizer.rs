//! Applying graph snapshots to scope trees.

use super::{NotifyTemplateGraphArgs, SyncOutcome, TemplateGraphSnapshot};
use crate::config::LinkConfig;
use crate::scope::{Containment, ScopeTree};
use crate::uri::{NormalizedUri, UriError};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

/// Counts from one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Linked-deployment scopes that were cleared
    pub candidate_scopes: usize,
    /// References attached to a scope
    pub attached: usize,
    /// References that matched no scope
    pub dropped: usize,
}

/// Rewrites the linked references held by scope trees.
///
/// Also numbers incoming notifications per root document and remembers the
/// last number applied, so that a late notification cannot overwrite a newer
/// one.
#[derive(Debug, Default)]
pub struct TemplateGraphSynchronizer {
    discard_stale: bool,
    received: DashMap<NormalizedUri, u64>,
    applied: DashMap<NormalizedUri, u64>,
}

impl TemplateGraphSynchronizer {
    /// Create a synchronizer.
    #[must_use]
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            discard_stale: config.discard_stale_snapshots,
            received: DashMap::new(),
            applied: DashMap::new(),
        }
    }

    /// Turn a notification into a snapshot carrying the next sequence number
    /// for its root.
    ///
    /// # Errors
    ///
    /// Fails when `rootTemplateUri` is not an absolute URI.
    pub fn receive(&self, args: NotifyTemplateGraphArgs) -> Result<TemplateGraphSnapshot, UriError> {
        let root = NormalizedUri::parse(&args.root_template_uri)?;
        let sequence = {
            let mut counter = self.received.entry(root).or_insert(0);
            *counter += 1;
            *counter
        };

        let snapshot = TemplateGraphSnapshot::from_notification(args, sequence)?;
        info!(
            "Template graph #{} for {}: {} linked template(s)",
            snapshot.sequence,
            snapshot.root_uri,
            snapshot.references.len()
        );
        Ok(snapshot)
    }

    /// Apply a snapshot unless a newer one for the same root was already
    /// applied. `tree` is `None` when no scope tree is registered for the
    /// root; the sequence number still advances.
    pub fn apply(&self, snapshot: &TemplateGraphSnapshot, tree: Option<&mut ScopeTree>) -> SyncOutcome {
        let mut last = self.applied.entry(snapshot.root_uri.clone()).or_insert(0);
        if self.discard_stale && snapshot.sequence <= *last {
            debug!(
                "Discarding stale template graph #{} for {} (last applied #{})",
                snapshot.sequence, snapshot.root_uri, *last
            );
            return SyncOutcome::Stale;
        }
        *last = (*last).max(snapshot.sequence);

        match tree {
            Some(tree) => SyncOutcome::Applied(Self::synchronize(snapshot, tree)),
            None => {
                debug!("No scope tree registered for {}", snapshot.root_uri);
                SyncOutcome::NoScopeTree
            }
        }
    }

    /// Sequence number of the last snapshot applied for `root`.
    #[must_use]
    pub fn last_applied(&self, root: &NormalizedUri) -> Option<u64> {
        self.applied.get(root).map(|entry| *entry.value())
    }

    /// Forget the sequence numbers of a closed document.
    pub fn forget(&self, root: &NormalizedUri) {
        self.received.remove(root);
        self.applied.remove(root);
    }

    /// Rebuild the linked references of every linked-deployment scope in
    /// `tree` from `snapshot`.
    ///
    /// All candidate scopes are cleared first. Each reference's source
    /// position is converted to a character offset and attached to the
    /// linked-deployment scope strictly enclosing it (the innermost one if
    /// several do). References outside every such scope, or past the end of
    /// the document, are dropped.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot's root URI differs from the tree's document URI.
    pub fn synchronize(snapshot: &TemplateGraphSnapshot, tree: &mut ScopeTree) -> SyncReport {
        assert_eq!(
            &snapshot.root_uri,
            tree.document_uri(),
            "template graph root does not match the scope tree's document"
        );

        let candidates = tree.linked_deployment_scopes();
        for &id in &candidates {
            tree.clear_linked_references(id);
        }

        let mut report = SyncReport {
            candidate_scopes: candidates.len(),
            ..SyncReport::default()
        };

        for reference in &snapshot.references {
            let Some(offset) = tree.line_index().offset(reference.source_position) else {
                debug!(
                    "Dropping linked template {}: position {} is outside the document",
                    reference.id, reference.source_position
                );
                report.dropped += 1;
                continue;
            };

            let owner = candidates
                .iter()
                .copied()
                .filter(|&id| tree.scope(id).span().contains(offset, Containment::Enclosed))
                .min_by_key(|&id| tree.scope(id).span().length);

            match owner {
                Some(id) => {
                    debug!(
                        "Attaching linked template {} ({}) to scope #{}",
                        reference.id,
                        reference.target_uri,
                        id.index()
                    );
                    tree.attach_linked_reference(id, reference.clone());
                    report.attached += 1;
                }
                None => {
                    debug!(
                        "Dropping linked template {}: offset {} is not inside a template link",
                        reference.id, offset
                    );
                    report.dropped += 1;
                }
            }
        }

        report
    }
}

//! The link session: one context object for everything armlink shares.
//!
//! A [`LinkSession`] owns the configuration, the document store, the linked
//! file loader, the graph synchronizer and the scope trees of open documents.
//! A language-server host creates one session and routes its two custom
//! messages to it:
//!
//! - `armTemplate/requestOpenLinkedFile` → [`LinkSession::on_request_open_linked_file`]
//! - `armTemplate/notifyTemplateGraph` → [`LinkSession::on_notify_template_graph`]
//!
//! Nothing is global. Cached documents live exactly as long as the session,
//! or until the host closes them with [`LinkSession::close_document`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use armlink::config::LinkConfig;
//! use armlink::graph::NotifyTemplateGraphArgs;
//! use armlink::scope::ScopeTree;
//! use armlink::session::LinkSession;
//! use armlink::uri::NormalizedUri;
//!
//! # fn example(text: &str) -> anyhow::Result<()> {
//! let session = LinkSession::new(LinkConfig::default());
//! let uri = NormalizedUri::parse("file:///templates/main.json")?;
//! session.register_scope_tree(ScopeTree::new(uri, text));
//!
//! let args: NotifyTemplateGraphArgs = serde_json::from_str(
//!     r#"{ "rootTemplateUri": "file:///templates/main.json", "linkedTemplates": [] }"#,
//! )?;
//! let outcome = session.on_notify_template_graph(args)?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

use crate::config::LinkConfig;
use crate::core::ArmlinkError;
use crate::document::{DocumentStore, FsDocumentStore};
use crate::graph::{NotifyTemplateGraphArgs, SyncOutcome, TemplateGraphSynchronizer};
use crate::links::LinkedTemplateReference;
use crate::parameters::{ParameterDefinition, parameter_definitions_from_linked_template};
use crate::resolver::{LinkedFileLoader, OpenLinkedFileRequest, OpenLinkedFileResponse};
use crate::scope::ScopeTree;
use crate::uri::{NormalizedUri, UriKey};
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// A scope tree shared between the session and its host.
pub type SharedScopeTree = Arc<RwLock<ScopeTree>>;

/// Shared state for resolving linked templates and synchronizing their graph.
pub struct LinkSession {
    config: LinkConfig,
    store: Arc<dyn DocumentStore>,
    loader: LinkedFileLoader,
    synchronizer: TemplateGraphSynchronizer,
    scope_trees: DashMap<NormalizedUri, SharedScopeTree>,
}

impl LinkSession {
    /// Create a session backed by the local filesystem.
    #[must_use]
    pub fn new(config: LinkConfig) -> Self {
        Self::with_store(config, Arc::new(FsDocumentStore::new()))
    }

    /// Create a session over a host-provided document store.
    #[must_use]
    pub fn with_store(config: LinkConfig, store: Arc<dyn DocumentStore>) -> Self {
        let loader = LinkedFileLoader::new(Arc::clone(&store), &config);
        let synchronizer = TemplateGraphSynchronizer::new(&config);
        Self {
            config,
            store,
            loader,
            synchronizer,
            scope_trees: DashMap::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// The document store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The linked file loader.
    #[must_use]
    pub fn loader(&self) -> &LinkedFileLoader {
        &self.loader
    }

    /// Register (or replace) the scope tree of a parsed document. Returns the
    /// shared handle.
    pub fn register_scope_tree(&self, tree: ScopeTree) -> SharedScopeTree {
        let uri = tree.document_uri().clone();
        let shared = Arc::new(RwLock::new(tree));
        debug!("Registered scope tree for {}", uri);
        self.scope_trees.insert(uri, Arc::clone(&shared));
        shared
    }

    /// The scope tree registered for a document.
    pub fn scope_tree<K: UriKey + ?Sized>(&self, uri: &K) -> Option<SharedScopeTree> {
        let uri = uri.to_normalized().ok()?;
        self.scope_trees.get(&uri).map(|entry| Arc::clone(entry.value()))
    }

    /// Handle `armTemplate/requestOpenLinkedFile`.
    ///
    /// # Panics
    ///
    /// Panics when the request's URIs are not absolute.
    pub async fn on_request_open_linked_file(
        &self,
        request: &OpenLinkedFileRequest,
    ) -> OpenLinkedFileResponse {
        self.loader.handle_open_request(request).await
    }

    /// Handle `armTemplate/notifyTemplateGraph`.
    ///
    /// # Errors
    ///
    /// Fails when `rootTemplateUri` is not an absolute URI.
    pub fn on_notify_template_graph(
        &self,
        args: NotifyTemplateGraphArgs,
    ) -> Result<SyncOutcome, ArmlinkError> {
        let snapshot = self.synchronizer.receive(args)?;

        let Some(tree) = self.scope_tree(&snapshot.root_uri) else {
            return Ok(self.synchronizer.apply(&snapshot, None));
        };

        let mut tree = tree.write().unwrap_or_else(PoisonError::into_inner);
        Ok(self.synchronizer.apply(&snapshot, Some(&mut *tree)))
    }

    /// The document was closed by the host: evict its cached load, scope tree
    /// and sequence numbers. Returns whether anything was removed.
    pub fn close_document<K: UriKey + ?Sized>(&self, uri: &K) -> bool {
        let Ok(uri) = uri.to_normalized() else {
            return false;
        };
        let had_document = self.store.close(&uri);
        let had_tree = self.scope_trees.remove(&uri).is_some();
        self.synchronizer.forget(&uri);
        if had_document || had_tree {
            debug!("Closed {}", uri);
        }
        had_document || had_tree
    }

    /// Parameter definitions of the template a reference points at, from
    /// whatever the store has already loaded.
    #[must_use]
    pub fn parameter_definitions_for(
        &self,
        reference: &LinkedTemplateReference,
    ) -> Vec<ParameterDefinition> {
        parameter_definitions_from_linked_template(reference, self.store.cache())
    }
}

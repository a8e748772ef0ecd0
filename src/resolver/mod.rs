//! Resolving and loading linked files.
//!
//! The [`LinkedFileLoader`] turns an OpenLinkedFile request into a document in
//! the shared [`DocumentStore`]:
//!
//! 1. Both request URIs are validated. They are produced by the analysis
//!    process and must be absolute; anything else is a programming error and
//!    panics.
//! 2. The resolved URI must be a `file:` URI that maps to a local path.
//! 3. The file must exist, otherwise the request fails with
//!    [`LoadError::NotFound`].
//! 4. The store loads the document. Errors, timeouts, and panics raised by the
//!    store all become [`LoadError::OpenFailed`].
//!
//! Data conditions never escape as panics: every outcome ends up in the
//! response's `loadErrorMessage`.
//!
//! # Concurrency
//!
//! Opens of the same normalized path are serialized by a per-path async mutex,
//! so at most one store load runs per file. The second caller finds the
//! document already cached by the store. Set
//! [`LinkConfig::dedupe_concurrent_opens`] to `false` to let opens race.
//!
//! # Examples
//!
//! ```rust,no_run
//! use armlink::config::LinkConfig;
//! use armlink::document::FsDocumentStore;
//! use armlink::links::ReferenceKind;
//! use armlink::resolver::LinkedFileLoader;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let loader = LinkedFileLoader::new(Arc::new(FsDocumentStore::new()), &LinkConfig::default());
//! match loader.open(Path::new("/templates/child.json"), ReferenceKind::TemplateLink).await {
//!     Ok(document) => println!("loaded {}", document.uri),
//!     Err(e) => eprintln!("{e}"),
//! }
//! # }
//! ```

mod request;


pub use request::{OpenLinkedFileRequest, OpenLinkedFileResponse};

use crate::config::LinkConfig;
use crate::core::LoadError;
use crate::document::{DocumentHandle, DocumentStore};
use crate::links::ReferenceKind;
use crate::uri::NormalizedUri;
use dashmap::DashMap;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Opens linked files through a shared document store.
pub struct LinkedFileLoader {
    store: Arc<dyn DocumentStore>,
    dedupe: bool,
    timeout: Option<Duration>,
    /// One lock per file currently being opened
    in_flight: DashMap<NormalizedUri, Arc<Mutex<()>>>,
}

impl LinkedFileLoader {
    /// Create a loader over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: &LinkConfig) -> Self {
        Self {
            store,
            dedupe: config.dedupe_concurrent_opens,
            timeout: config.open_timeout(),
            in_flight: DashMap::new(),
        }
    }

    /// The store documents are loaded into.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Serve an OpenLinkedFile request.
    ///
    /// # Panics
    ///
    /// Panics if `sourceDocumentUri` or `requestedLinkResolvedUri` is not an
    /// absolute URI.
    pub async fn handle_open_request(&self, request: &OpenLinkedFileRequest) -> OpenLinkedFileResponse {
        let source = contract_uri("sourceDocumentUri", &request.source_document_uri);
        let resolved = contract_uri("requestedLinkResolvedUri", &request.requested_link_resolved_uri);
        let kind = request.reference_kind;

        info!(
            "Opening linked {} {} (from {}, authored as '{}')",
            kind.file_noun(),
            resolved,
            source,
            request.requested_link_original_uri
        );

        match self.open_uri(&resolved, kind).await {
            Ok(document) => {
                debug!(
                    "Opened {} ({} parameter definitions)",
                    document.uri,
                    document.parameters.len()
                );
                OpenLinkedFileResponse::loaded()
            }
            Err(e) => {
                warn!("Failed to open linked file [{}]: {}", e.error_code(), e);
                OpenLinkedFileResponse::failed(e.to_string())
            }
        }
    }

    /// Open the file behind a resolved URI.
    ///
    /// # Errors
    ///
    /// [`LoadError::UnsupportedScheme`] for non-`file` URIs,
    /// [`LoadError::InvalidUri`] for file URIs without a local path, and
    /// anything [`open`](Self::open) returns.
    pub async fn open_uri(
        &self,
        uri: &NormalizedUri,
        kind: ReferenceKind,
    ) -> Result<DocumentHandle, LoadError> {
        if !uri.is_file() {
            return Err(LoadError::UnsupportedScheme {
                uri: uri.to_string(),
                scheme: uri.scheme().to_string(),
            });
        }

        let Some(path) = uri.to_file_path() else {
            return Err(LoadError::InvalidUri {
                uri: uri.to_string(),
                reason: "does not name a local file".to_string(),
            });
        };

        self.open(&path, kind).await
    }

    /// Open the file at an absolute local path.
    ///
    /// # Errors
    ///
    /// [`LoadError::NotFound`] when the file does not exist,
    /// [`LoadError::OpenFailed`] when the store fails, times out or panics.
    ///
    /// # Panics
    ///
    /// Panics if `local_path` is not absolute.
    pub async fn open(
        &self,
        local_path: &Path,
        kind: ReferenceKind,
    ) -> Result<DocumentHandle, LoadError> {
        assert!(
            local_path.is_absolute(),
            "linked file path must be absolute: {}",
            local_path.display()
        );

        let open_failed = |message: String| LoadError::OpenFailed {
            path: local_path.to_path_buf(),
            kind,
            message,
        };

        match tokio::fs::try_exists(local_path).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(LoadError::NotFound {
                    path: local_path.to_path_buf(),
                    kind,
                });
            }
            Err(e) => return Err(open_failed(e.to_string())),
        }

        let key = NormalizedUri::from_file_path(local_path).map_err(|e| LoadError::InvalidUri {
            uri: local_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let guard = if self.dedupe {
            let lock = Arc::clone(self.in_flight.entry(key.clone()).or_default().value());
            Some(lock.lock_owned().await)
        } else {
            None
        };

        let outcome = self.load_guarded(local_path).await;

        if let Some(guard) = guard {
            drop(guard);
            self.in_flight.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        }

        outcome.map_err(open_failed)
    }

    async fn load_guarded(&self, path: &Path) -> Result<DocumentHandle, String> {
        let load = AssertUnwindSafe(self.store.load(path)).catch_unwind();

        let caught = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, load).await {
                Ok(caught) => caught,
                Err(_) => return Err(format!("timed out after {} ms", limit.as_millis())),
            },
            None => load.await,
        };

        match caught {
            Ok(Ok(document)) => Ok(document),
            Ok(Err(e)) => Err(format!("{e:#}")),
            Err(payload) => Err(panic_message(payload.as_ref())),
        }
    }
}

fn contract_uri(field: &str, text: &str) -> NormalizedUri {
    match NormalizedUri::parse(text) {
        Ok(uri) => uri,
        Err(e) => panic!("{field} must be an absolute URI: {e}"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("document store panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("document store panicked: {message}")
    } else {
        "document store panicked".to_string()
    }
}

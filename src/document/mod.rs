//! The shared document store.
//!
//! Loading a linked file means handing its path to the store that owns every
//! open document. The store is a seam: the language-server host plugs in its
//! own implementation, while [`FsDocumentStore`] reads straight from disk and
//! is what the CLI and the tests use.
//!
//! Loads are idempotent. A store keeps one handle per normalized URI in a
//! [`NormalizedMap`] and returns the cached handle on repeated loads until the
//! document is closed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use armlink::document::{DocumentStore, FsDocumentStore};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = FsDocumentStore::new();
//! let document = store.load(Path::new("/templates/child.json")).await?;
//! println!("{} declares {} parameters", document.uri, document.parameters.len());
//! # Ok(())
//! # }
//! ```

use crate::parameters::{ParameterDefinition, ParameterDefinitionsSource};
use crate::uri::{NormalizedMap, NormalizedUri};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// A document loaded into the store.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Normalized URI of the document
    pub uri: NormalizedUri,
    /// Absolute path it was read from
    pub path: PathBuf,
    /// Full text
    pub text: String,
    /// Top-level parameter definitions
    pub parameters: Vec<ParameterDefinition>,
}

impl LoadedDocument {
    /// Wrap template text in a document.
    ///
    /// The text is kept whatever it contains. Parameter definitions are read
    /// on a best-effort basis: `//` and `/* */` comments are ignored, and text
    /// that still is not JSON (a file in the middle of an edit) has none.
    #[must_use]
    pub fn new(uri: NormalizedUri, path: PathBuf, text: String) -> Self {
        let parameters = match serde_json::from_str::<Value>(&strip_json_comments(&text)) {
            Ok(value) => ParameterDefinition::from_template(&value),
            Err(e) => {
                debug!("No parameter definitions for {}: {}", path.display(), e);
                Vec::new()
            }
        };

        Self {
            uri,
            path,
            text,
            parameters,
        }
    }
}

/// Replace `//` and `/* */` comments outside string literals with spaces.
///
/// Line breaks inside block comments are kept so error positions still match
/// the original text.
fn strip_json_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' || next == '\r' {
                        break;
                    }
                    chars.next();
                    out.push(' ');
                }
                out.push(' ');
            }
            ('/', Some('*')) => {
                chars.next();
                out.push_str("  ");
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if next == '\n' || next == '\r' {
                        out.push(next);
                    } else {
                        out.push(' ');
                    }
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

impl ParameterDefinitionsSource for LoadedDocument {
    fn parameter_definitions(&self) -> &[ParameterDefinition] {
        &self.parameters
    }
}

/// Shared handle to a loaded document.
pub type DocumentHandle = Arc<LoadedDocument>;

/// The store that owns loaded documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load the document at an absolute path, or return the cached handle.
    ///
    /// # Errors
    ///
    /// Any failure to read the document. Content that is not valid JSON is
    /// not an error.
    async fn load(&self, path: &Path) -> Result<DocumentHandle>;

    /// The cache of loaded documents, keyed by normalized URI.
    fn cache(&self) -> &NormalizedMap<DocumentHandle>;

    /// Drop a document from the cache. Returns whether it was present.
    fn close(&self, uri: &NormalizedUri) -> bool {
        self.cache().remove(uri).is_some()
    }
}

/// [`DocumentStore`] backed by the local filesystem.
#[derive(Debug, Default)]
pub struct FsDocumentStore {
    cache: NormalizedMap<DocumentHandle>,
    loads: AtomicUsize,
}

impl FsDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times a document was actually read from disk.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn load(&self, path: &Path) -> Result<DocumentHandle> {
        let uri = NormalizedUri::from_file_path(path)?;
        if let Some(existing) = self.cache.get(&uri) {
            debug!("Document already loaded: {}", uri);
            return Ok(existing);
        }

        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.loads.fetch_add(1, Ordering::SeqCst);

        let document = Arc::new(LoadedDocument::new(uri.clone(), path.to_path_buf(), text));
        debug!(
            "Loaded {} ({} parameter definitions)",
            uri,
            document.parameters.len()
        );
        self.cache.set(&uri, Arc::clone(&document))?;
        Ok(document)
    }

    fn cache(&self) -> &NormalizedMap<DocumentHandle> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_reads_parameters() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("child.json");
        tokio::fs::write(
            &path,
            r#"{ "parameters": { "location": { "type": "string" } }, "resources": [] }"#,
        )
        .await
        .unwrap();

        let store = FsDocumentStore::new();
        let document = store.load(&path).await.unwrap();

        assert_eq!(document.parameters.len(), 1);
        assert_eq!(document.parameters[0].name, "location");
        assert!(store.cache().has(&path));
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("child.json");
        tokio::fs::write(&path, "{}").await.unwrap();

        let store = FsDocumentStore::new();
        let first = store.load(&path).await.unwrap();
        let second = store.load(&path).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.load_count(), 1);
    }

    #[tokio::test]
    async fn test_close_evicts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("child.json");
        tokio::fs::write(&path, "{}").await.unwrap();

        let store = FsDocumentStore::new();
        let document = store.load(&path).await.unwrap();
        assert!(store.close(&document.uri));
        assert!(!store.close(&document.uri));

        store.load(&path).await.unwrap();
        assert_eq!(store.load_count(), 2);
    }

    #[tokio::test]
    async fn test_load_keeps_malformed_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("editing.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = FsDocumentStore::new();
        let document = store.load(&path).await.unwrap();
        assert_eq!(document.text, "{ not json");
        assert!(document.parameters.is_empty());
        assert!(store.cache().has(&path));
    }

    #[tokio::test]
    async fn test_load_commented_template() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("child.json");
        let text = r#"{
  // storage account
  "parameters": {
    /* the account name,
       lower case */
    "storageName": { "type": "string", "defaultValue": "http://not/a/comment" }
  }
}"#;
        tokio::fs::write(&path, text).await.unwrap();

        let store = FsDocumentStore::new();
        let document = store.load(&path).await.unwrap();
        assert_eq!(document.text, text);
        assert_eq!(document.parameters.len(), 1);
        assert_eq!(
            document.parameters[0].default_value,
            Some(Value::from("http://not/a/comment"))
        );
    }

    #[test]
    fn test_strip_json_comments() {
        let text = "{ \"a\": \"x\\\"//y\" // c\n /* d\n e */ }";
        let stripped = strip_json_comments(text);
        assert_eq!(stripped.chars().count(), text.chars().count());
        let value: Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value["a"], "x\"//y");
        assert_eq!(stripped.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let store = FsDocumentStore::new();
        let error = store.load(&temp.path().join("absent.json")).await.unwrap_err();
        assert!(error.to_string().contains("Failed to read"));
    }
}

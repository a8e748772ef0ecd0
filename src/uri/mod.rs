//! URI normalization and the URI-keyed document cache.
//!
//! Linked templates are identified by URIs that arrive from several places: the
//! analysis process, the editor, and paths typed by template authors. The same
//! file can therefore show up spelled in many ways:
//!
//! - `FILE:///templates/child.json` vs `file:///templates/child.json`
//! - `file:///templates/child.json?linked=%2Fmain.json` (query added by the analysis process)
//! - `file:///templates/sub/` vs `file:///templates/sub`
//! - `https://Example.COM:443/child.json` vs `https://example.com/child.json`
//!
//! [`NormalizedUri`] folds all of these into one canonical key, and
//! [`NormalizedMap`] is a concurrent map that normalizes every key before it is
//! compared or stored. The map is used both to deduplicate loads and as the
//! lookup table consulted during graph synchronization.
//!
//! # Normalization rules
//!
//! 1. The URI must be absolute and hierarchical (`scheme://...`).
//! 2. Scheme and host are lower-cased and default ports are dropped.
//! 3. Query string and fragment are removed.
//! 4. A trailing `/` is removed unless the path is the root.
//! 5. `file` URIs are round-tripped through the local path so percent-encoding
//!    is canonical, and on case-insensitive platforms the path is lower-cased.
//!
//! # Examples
//!
//! ```rust
//! use armlink::uri::{NormalizedMap, NormalizedUri};
//!
//! let a = NormalizedUri::parse("FILE:///templates/child.json?linked=1").unwrap();
//! let b = NormalizedUri::parse("file:///templates/child.json").unwrap();
//! assert_eq!(a, b);
//!
//! let map: NormalizedMap<u32> = NormalizedMap::new();
//! map.set("file:///templates/child.json/", 7).unwrap();
//! assert_eq!(map.get("file:///templates/child.json?x=y"), Some(7));
//! ```

use dashmap::DashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors produced while normalizing a URI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// The text could not be parsed as an absolute URI
    #[error("Invalid URI '{uri}': {reason}")]
    Invalid {
        /// The text that failed to parse
        uri: String,
        /// Why parsing failed
        reason: String,
    },

    /// A filesystem path could not be turned into a `file` URI
    #[error("Path '{path}' cannot be expressed as a file URI")]
    NotAbsolutePath {
        /// The offending path
        path: PathBuf,
    },
}

/// A URI in canonical form, suitable as a map key.
///
/// Equality and hashing are defined on the canonical serialization, so two
/// `NormalizedUri` values compare equal exactly when they denote the same
/// resource under the rules in the [module documentation](self).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUri(Url);

impl NormalizedUri {
    /// Parse and normalize a URI string.
    ///
    /// # Errors
    ///
    /// Returns [`UriError::Invalid`] when the text is not an absolute,
    /// hierarchical URI (relative references, `mailto:` and the like).
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let url = Url::parse(uri.trim()).map_err(|e| UriError::Invalid {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(url).map_err(|reason| UriError::Invalid {
            uri: uri.to_string(),
            reason,
        })
    }

    /// Build a normalized `file` URI from an absolute filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`UriError::NotAbsolutePath`] for relative paths.
    pub fn from_file_path(path: &Path) -> Result<Self, UriError> {
        let url = Url::from_file_path(path).map_err(|()| UriError::NotAbsolutePath {
            path: path.to_path_buf(),
        })?;
        Self::from_url(url).map_err(|_| UriError::NotAbsolutePath {
            path: path.to_path_buf(),
        })
    }

    fn from_url(mut url: Url) -> Result<Self, String> {
        if url.cannot_be_a_base() {
            return Err("URI is not hierarchical".to_string());
        }

        url.set_query(None);
        url.set_fragment(None);

        if url.scheme() == "file" {
            // Round-trip through the local path to canonicalize percent-encoding
            if let Ok(path) = url.to_file_path() {
                if let Ok(reencoded) = Url::from_file_path(&path) {
                    url = reencoded;
                }
            }
            if cfg!(any(windows, target_os = "macos")) {
                let folded = url.path().to_lowercase();
                url.set_path(&folded);
            }
        }

        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/');
            let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
            url.set_path(&trimmed);
        }

        Ok(Self(url))
    }

    /// The canonical URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The canonical serialization.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The URI scheme, always lower case.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Whether this is a `file` URI.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.0.scheme() == "file"
    }

    /// The local filesystem path of a `file` URI.
    ///
    /// Returns `None` for other schemes or for `file` URIs naming a remote host.
    #[must_use]
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if !self.is_file() {
            return None;
        }
        self.0.to_file_path().ok()
    }
}

impl fmt::Display for NormalizedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Anything that can be used as a key of a [`NormalizedMap`].
///
/// Implemented for string-ish URIs, [`Url`], filesystem paths and
/// [`NormalizedUri`] itself.
pub trait UriKey {
    /// Normalize into a cache key.
    ///
    /// # Errors
    ///
    /// Returns a [`UriError`] when the value is not an absolute URI or path.
    fn to_normalized(&self) -> Result<NormalizedUri, UriError>;
}

impl UriKey for NormalizedUri {
    fn to_normalized(&self) -> Result<NormalizedUri, UriError> {
        Ok(self.clone())
    }
}

impl UriKey for str {
    fn to_normalized(&self) -> Result<NormalizedUri, UriError> {
        NormalizedUri::parse(self)
    }
}

impl UriKey for String {
    fn to_normalized(&self) -> Result<NormalizedUri, UriError> {
        NormalizedUri::parse(self)
    }
}

impl UriKey for Url {
    fn to_normalized(&self) -> Result<NormalizedUri, UriError> {
        NormalizedUri::parse(self.as_str())
    }
}

impl UriKey for Path {
    fn to_normalized(&self) -> Result<NormalizedUri, UriError> {
        NormalizedUri::from_file_path(self)
    }
}

impl UriKey for PathBuf {
    fn to_normalized(&self) -> Result<NormalizedUri, UriError> {
        NormalizedUri::from_file_path(self)
    }
}

impl<T: UriKey + ?Sized> UriKey for &T {
    fn to_normalized(&self) -> Result<NormalizedUri, UriError> {
        (**self).to_normalized()
    }
}

/// A concurrent map keyed by normalized URI.
///
/// Every operation normalizes its key first, so lookups succeed regardless of
/// which spelling of a URI was used to insert the entry. Keys that fail to
/// normalize are never present: [`get`](Self::get) returns `None`,
/// [`has`](Self::has) returns `false`, and [`set`](Self::set) reports the error.
///
/// The map never evicts entries on its own; removal is always an explicit call
/// made by whoever owns the document lifecycle.
#[derive(Debug)]
pub struct NormalizedMap<V> {
    entries: DashMap<NormalizedUri, V>,
}

impl<V> Default for NormalizedMap<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V: Clone> NormalizedMap<V> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the value stored under the normalized form of `key`.
    pub fn get<K: UriKey + ?Sized>(&self, key: &K) -> Option<V> {
        let key = key.to_normalized().ok()?;
        self.entries.get(&key).map(|entry| entry.value().clone())
    }

    /// Store `value` under the normalized form of `key`, returning the value it
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`UriError`] when `key` cannot be normalized.
    pub fn set<K: UriKey + ?Sized>(&self, key: &K, value: V) -> Result<Option<V>, UriError> {
        let key = key.to_normalized()?;
        Ok(self.entries.insert(key, value))
    }

    /// Whether an entry exists for the normalized form of `key`.
    pub fn has<K: UriKey + ?Sized>(&self, key: &K) -> bool {
        key.to_normalized()
            .map(|key| self.entries.contains_key(&key))
            .unwrap_or(false)
    }

    /// Remove and return the entry for the normalized form of `key`.
    pub fn remove<K: UriKey + ?Sized>(&self, key: &K) -> Option<V> {
        let key = key.to_normalized().ok()?;
        self.entries.remove(&key).map(|(_, value)| value)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the current keys, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<NormalizedUri> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

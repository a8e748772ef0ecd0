//! Test utilities for armlink
//!
//! Helpers shared by unit tests and the integration suite: logging setup and
//! small template fixtures with known link-site positions.
//!
//! Available to integration tests through the `test-utils` feature.
//!
//! # Example
//!
//! ```rust,no_run
//! use armlink::test_utils::{init_test_logging, LinkFixture};
//!
//! init_test_logging(None);
//! let fixture = LinkFixture::new("child.json");
//! assert!(fixture.resource_span.contains(
//!     fixture.link_offset(),
//!     armlink::scope::Containment::Enclosed,
//! ));
//! ```

use crate::links::SourcePosition;
use crate::scope::{LineIndex, Span};
use crate::uri::NormalizedUri;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` if given, else `RUST_LOG`;
/// with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=armlink=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Write `contents` to `dir/name` and return the path.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_template(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
    path
}

/// `file:` URI of an absolute path.
///
/// # Panics
///
/// Panics if `path` is relative.
#[must_use]
pub fn file_uri(path: &Path) -> String {
    NormalizedUri::from_file_path(path)
        .unwrap_or_else(|e| panic!("{e}"))
        .to_string()
}

/// A root template containing exactly one `templateLink` deployment.
#[derive(Debug, Clone)]
pub struct LinkFixture {
    /// Template text
    pub text: String,
    /// Span of the deployment resource object, braces included
    pub resource_span: Span,
    /// Position of the `"templateLink"` key
    pub link_position: SourcePosition,
}

impl LinkFixture {
    /// Build a template whose deployment links to `relative_path`.
    #[must_use]
    pub fn new(relative_path: &str) -> Self {
        let text = format!(
            r#"{{
  "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
  "resources": [
    {{
      "type": "Microsoft.Resources/deployments",
      "name": "child",
      "properties": {{
        "templateLink": {{ "relativePath": "{relative_path}" }}
      }}
    }}
  ]
}}
"#
        );

        let start = text.find("    {\n").map(|at| at + 4).unwrap_or_default();
        let after_end = text.find("\n    }\n").map(|at| at + 6).unwrap_or_default();

        Self {
            text,
            resource_span: Span::from_bounds(start, after_end),
            link_position: SourcePosition::new(7, 8),
        }
    }

    /// Character offset of the link site.
    #[must_use]
    pub fn link_offset(&self) -> usize {
        LineIndex::new(&self.text)
            .offset(self.link_position)
            .unwrap_or_default()
    }
}

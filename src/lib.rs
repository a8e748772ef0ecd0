//! armlink - linked template graph core for ARM deployment templates
//!
//! Deployment templates link to other templates through `templateLink`
//! resources and to parameter files through `parametersLink`. armlink is the
//! part of a template language server that keeps track of those links: it
//! opens linked files on request, and it attaches the linked-template graph
//! reported by the analysis process to the scope tree of the parsed root
//! document.
//!
//! # Architecture Overview
//!
//! Two independent flows meet in a [`session::LinkSession`]:
//!
//! - **Open requests**: the analysis process asks for a linked file. The
//!   [`resolver`] checks that the file exists and loads it into the shared
//!   [`document`] store, answering with an optional error message.
//! - **Graph notifications**: the analysis process reports every linked
//!   reference of a root document. The [`graph`] synchronizer maps each
//!   reference's `(line, column)` onto the root's [`scope`] tree and rewrites
//!   the references attached to each template-link resource.
//!
//! ```text
//! analysis process ──notifyTemplateGraph──▶ graph ──▶ scope tree
//!        │
//!        └──requestOpenLinkedFile──▶ resolver ──▶ document store ──▶ response
//! ```
//!
//! # Core Modules
//!
//! ## Data model
//! - [`links`] - Linked template references and their load-state machine
//! - [`scope`] - Scope trees, spans and line/column conversion
//! - [`uri`] - URI normalization and the URI-keyed cache
//! - [`parameters`] - Parameter definitions exposed by linked templates
//!
//! ## Operations
//! - [`document`] - The shared document store
//! - [`resolver`] - Opening linked files
//! - [`graph`] - Applying graph notifications to scope trees
//! - [`session`] - The context object tying everything together
//!
//! ## Supporting modules
//! - [`config`] - Layered configuration (`~/.armlink/config.toml`, `ARMLINK_*`)
//! - [`core`] - Error types and user-facing error reporting
//! - [`cli`] - The `armlink` diagnostic command line
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Run an OpenLinkedFile request
//! armlink open file:///templates/main.json file:///templates/child.json --kind template-relative-link
//!
//! # Apply a graph notification to a scope tree and print the attachments
//! armlink sync --tree tree.json --notification graph.json
//!
//! # Show the parameters a template declares
//! armlink params templates/child.json
//! ```

// Data model
pub mod links;
pub mod parameters;
pub mod scope;
pub mod uri;

// Operations
pub mod document;
pub mod graph;
pub mod resolver;
pub mod session;

// Supporting modules
pub mod cli;
pub mod config;
pub mod core;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

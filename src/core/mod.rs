//! Core types for armlink
//!
//! Error handling shared by every module:
//!
//! - [`LoadError`] - why a linked file could not be opened. Its `Display` is
//!   the message sent back to the analysis process.
//! - [`ArmlinkError`] - every other failure the library reports
//! - [`ErrorContext`] - an error plus a suggestion and details, rendered in
//!   colour by the CLI
//! - [`user_friendly_error`] - turns any [`anyhow::Error`] into an
//!   [`ErrorContext`], recognizing armlink's own errors anywhere in the chain
//!
//! Library code returns the typed errors; application code (CLI commands,
//! configuration loading) works with [`anyhow::Result`] and adds context on
//! the way up.
//!
//! # Examples
//!
//! ```rust
//! use armlink::core::{ErrorContext, LoadError, user_friendly_error};
//! use armlink::links::ReferenceKind;
//! use std::path::PathBuf;
//!
//! let error = LoadError::NotFound {
//!     path: PathBuf::from("/templates/params.json"),
//!     kind: ReferenceKind::ParametersLink,
//! };
//! assert_eq!(
//!     error.to_string(),
//!     "Could not find linked parameter file \"/templates/params.json\""
//! );
//!
//! let context: ErrorContext = user_friendly_error(error.into());
//! assert!(context.suggestion.is_some());
//! ```

pub mod error;

pub use error::{ArmlinkError, ErrorContext, LoadError, user_friendly_error};

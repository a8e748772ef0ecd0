//! Error handling for armlink
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** for the library surface, so callers can match on
//!    exactly what went wrong while loading or synchronizing linked templates
//! 2. **User-friendly messages** with suggestions for the command-line front end
//!
//! # Architecture
//!
//! - [`LoadError`] - the recoverable outcome of opening a linked file. Its
//!   `Display` text is the message surfaced to the requester, worded for
//!   parameter files or template files depending on the reference kind.
//! - [`ArmlinkError`] - every failure the crate can report, including wrapped
//!   [`LoadError`], [`UriError`] and [`TransitionError`] values.
//! - [`ErrorContext`] - wrapper that adds a suggestion and details for display.
//!
//! Contract violations (a relative path handed to the loader, a notification
//! routed to the wrong document) are *not* represented here. They are caller
//! bugs and abort the current operation with a panic.
//!
//! # Examples
//!
//! ```rust
//! use armlink::core::LoadError;
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
//! ```

use crate::links::{ReferenceKind, TransitionError};
use crate::scope::ScopeTreeError;
use crate::uri::UriError;
use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a linked file could not be opened.
///
/// Every variant is a data condition that the loader recovers from locally.
/// The message produced by `Display` is what ends up in
/// `OpenLinkedFileResponse::load_error_message` and, through the analysis
/// process, in the diagnostic shown at the link site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The resolved file does not exist on disk
    #[error("Could not find linked {} \"{}\"", .kind.file_noun(), .path.display())]
    NotFound {
        /// Absolute path that was checked
        path: PathBuf,
        /// Kind of link site that requested the file
        kind: ReferenceKind,
    },

    /// The file exists but the document store rejected it
    ///
    /// Covers permission problems, undecodable content, store timeouts, and
    /// panics raised by the store while loading.
    #[error("Could not load linked {} \"{}\": {message}", .kind.file_noun(), .path.display())]
    OpenFailed {
        /// Absolute path that failed to load
        path: PathBuf,
        /// Kind of link site that requested the file
        kind: ReferenceKind,
        /// The store's original error message
        message: String,
    },

    /// The requested URI could not be parsed
    #[error("Invalid linked file URI '{uri}': {reason}")]
    InvalidUri {
        /// The URI text as received
        uri: String,
        /// Parser message
        reason: String,
    },

    /// The requested URI uses a scheme that cannot be loaded from disk
    #[error("Linked files with scheme '{scheme}' are not supported: {uri}")]
    UnsupportedScheme {
        /// The normalized URI
        uri: String,
        /// Its scheme
        scheme: String,
    },
}

impl LoadError {
    /// Stable short name of the error category, used in logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            LoadError::NotFound { .. } => "NotFound",
            LoadError::OpenFailed { .. } => "OpenFailed",
            LoadError::InvalidUri { .. } => "InvalidUri",
            LoadError::UnsupportedScheme { .. } => "UnsupportedScheme",
        }
    }
}

/// The main error type for armlink operations
///
/// # Error Categories
///
/// - [`Load`](ArmlinkError::Load) - opening a linked file failed
/// - [`Uri`](ArmlinkError::Uri) - a URI or path could not be normalized
/// - [`Transition`](ArmlinkError::Transition) - an illegal load-state change was requested
/// - [`ScopeTree`](ArmlinkError::ScopeTree) - a scope tree violated the nesting rules
/// - [`ConfigError`](ArmlinkError::ConfigError) - configuration could not be read or applied
/// - [`InvalidPayload`](ArmlinkError::InvalidPayload) - a notification, request, or scope-tree
///   document was not valid JSON of the expected shape
/// - [`ScopeTreeNotFound`](ArmlinkError::ScopeTreeNotFound) - no scope tree is registered for a document
/// - [`StaleNotification`](ArmlinkError::StaleNotification) - a graph notification was older than one already applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArmlinkError {
    /// Opening a linked file failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A URI could not be normalized
    #[error(transparent)]
    Uri(#[from] UriError),

    /// An illegal load-state transition was requested
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A scope tree could not be assembled
    #[error(transparent)]
    ScopeTree(#[from] ScopeTreeError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// A JSON payload did not have the expected shape
    #[error("Invalid {what} in {file}: {reason}")]
    InvalidPayload {
        /// What kind of payload was being read ("notification", "scope tree", ...)
        what: String,
        /// Where it was read from
        file: String,
        /// Parser message
        reason: String,
    },

    /// No scope tree registered for a document
    #[error("No scope tree is registered for document {uri}")]
    ScopeTreeNotFound {
        /// The normalized document URI
        uri: String,
    },

    /// A newer graph notification was already applied for the document
    #[error("Template graph notification for {uri} is older than the last one applied")]
    StaleNotification {
        /// The normalized root template URI
        uri: String,
    },
}

/// Error wrapper carrying user-facing guidance.
///
/// Used by the command-line front end to print an error together with a
/// suggestion (green) and details (yellow).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {:#}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error to a user-friendly [`ErrorContext`]
///
/// Recognizes [`ArmlinkError`], [`LoadError`], [`toml::de::Error`],
/// [`serde_json::Error`] and [`std::io::Error`] anywhere in the error chain
/// and attaches a matching suggestion. Anything else is passed through as is.
///
/// # Examples
///
/// ```rust
/// use armlink::core::{user_friendly_error, ArmlinkError};
///
/// let error = ArmlinkError::ScopeTreeNotFound { uri: "file:///main.json".into() };
/// let context = user_friendly_error(anyhow::Error::from(error));
/// assert!(context.suggestion.is_some());
/// ```
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let (suggestion, details) = suggestion_for(&error);
    let mut context = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        context = context.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        context = context.with_details(details);
    }
    context
}

fn suggestion_for(error: &anyhow::Error) -> (Option<&'static str>, Option<&'static str>) {
    for cause in error.chain() {
        if let Some(load) = cause.downcast_ref::<LoadError>() {
            return load_suggestion(load);
        }

        if let Some(armlink) = cause.downcast_ref::<ArmlinkError>() {
            return match armlink {
                ArmlinkError::Load(load) => load_suggestion(load),
                ArmlinkError::Uri(_) => (
                    Some("Pass an absolute URI such as file:///path/to/template.json"),
                    Some("Relative references must be resolved against their parent document before they reach armlink"),
                ),
                ArmlinkError::Transition(_) => (
                    None,
                    Some("Linked references only move NotLoaded -> Loading -> SuccessfullyLoaded/LoadFailed, or directly to TooDeep/NotSupported"),
                ),
                ArmlinkError::ScopeTree(_) => (
                    Some("Check that every scope span lies inside its parent and does not overlap its siblings"),
                    None,
                ),
                ArmlinkError::ConfigError { .. } => (
                    Some("Check ~/.armlink/config.toml and the ARMLINK_* environment variables"),
                    None,
                ),
                ArmlinkError::InvalidPayload { .. } => (
                    Some("Check that the file is valid JSON with camelCase field names"),
                    None,
                ),
                ArmlinkError::ScopeTreeNotFound { .. } => (
                    Some("Register the document's scope tree before sending graph notifications for it"),
                    None,
                ),
                ArmlinkError::StaleNotification { .. } => (
                    None,
                    Some("Notifications are numbered on receipt; set discard_stale_snapshots = false to apply every one"),
                ),
            };
        }

        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return (
                Some("Check the TOML syntax of the configuration file. Verify quotes, brackets, and key names"),
                Some("Unknown keys are rejected"),
            );
        }

        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return (
                Some("Check that the file is valid JSON with camelCase field names"),
                None,
            );
        }

        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return match io.kind() {
                std::io::ErrorKind::NotFound => (
                    Some("Check that the file or directory exists and the path is correct"),
                    None,
                ),
                std::io::ErrorKind::PermissionDenied => (
                    Some("Check the file's ownership and permissions"),
                    None,
                ),
                _ => (None, None),
            };
        }
    }

    (None, None)
}

fn load_suggestion(error: &LoadError) -> (Option<&'static str>, Option<&'static str>) {
    match error {
        LoadError::NotFound { .. } => (
            Some("Check the relative path in the templateLink/parametersLink against the parent template's folder"),
            None,
        ),
        LoadError::OpenFailed { .. } => (
            Some("Check that the file is readable and saved as UTF-8"),
            None,
        ),
        LoadError::InvalidUri { .. } => (
            Some("Pass an absolute URI such as file:///path/to/template.json"),
            None,
        ),
        LoadError::UnsupportedScheme { .. } => (
            None,
            Some("Only file: URIs can be opened locally; remote templates are validated by the analysis process"),
        ),
    }
}

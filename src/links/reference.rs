//! The [`LinkedTemplateReference`] data shape and its state transitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Load state of a linked template reference.
///
/// On the wire the state is a numeric code (see [`LoadState::code`]) and the
/// failure message travels in a separate `loadErrorMessage` field. Here the
/// message is part of [`LoadState::LoadFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No load has been attempted yet
    #[default]
    NotLoaded,
    /// A load is in progress
    Loading,
    /// The linked file was loaded
    SuccessfullyLoaded,
    /// The linked file could not be loaded
    LoadFailed {
        /// Human-readable reason, shown at the link site
        message: String,
    },
    /// The analysis process stopped following links at this depth
    TooDeep,
    /// The link cannot be followed (e.g. a remote URI)
    NotSupported,
}

impl LoadState {
    /// Numeric wire code: 0 NotLoaded, 1 Loading, 2 SuccessfullyLoaded,
    /// 3 LoadFailed, 4 TooDeep, 5 NotSupported.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            LoadState::NotLoaded => 0,
            LoadState::Loading => 1,
            LoadState::SuccessfullyLoaded => 2,
            LoadState::LoadFailed { .. } => 3,
            LoadState::TooDeep => 4,
            LoadState::NotSupported => 5,
        }
    }

    /// Rebuild a state from its wire representation.
    ///
    /// # Errors
    ///
    /// Fails for unknown codes and whenever the presence of `message` does not
    /// match the code (a message is required for 3 and forbidden otherwise).
    pub fn from_wire(code: u8, message: Option<String>) -> Result<Self, String> {
        let state = match (code, message) {
            (3, Some(message)) => return Ok(LoadState::LoadFailed { message }),
            (3, None) => return Err("loadState LoadFailed requires a loadErrorMessage".to_string()),
            (_, Some(_)) => {
                return Err(format!(
                    "loadErrorMessage is only allowed with loadState LoadFailed (got {code})"
                ));
            }
            (0, None) => LoadState::NotLoaded,
            (1, None) => LoadState::Loading,
            (2, None) => LoadState::SuccessfullyLoaded,
            (4, None) => LoadState::TooDeep,
            (5, None) => LoadState::NotSupported,
            (other, None) => return Err(format!("unknown loadState {other}")),
        };
        Ok(state)
    }

    /// Display name of the state.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            LoadState::NotLoaded => "NotLoaded",
            LoadState::Loading => "Loading",
            LoadState::SuccessfullyLoaded => "SuccessfullyLoaded",
            LoadState::LoadFailed { .. } => "LoadFailed",
            LoadState::TooDeep => "TooDeep",
            LoadState::NotSupported => "NotSupported",
        }
    }

    /// The failure message, present exactly when the state is `LoadFailed`.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadState::LoadFailed { message } => Some(message),
            _ => None,
        }
    }

    /// Whether the state can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadState::NotLoaded | LoadState::Loading)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::LoadFailed { message } => write!(f, "LoadFailed ({message})"),
            other => f.write_str(other.name()),
        }
    }
}

/// A load-state change that the state machine does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Illegal load state transition for linked template '{id}': {from} -> {to}")]
pub struct TransitionError {
    /// Id of the reference
    pub id: String,
    /// State the reference was in
    pub from: &'static str,
    /// State that was requested
    pub to: &'static str,
}

/// Zero-based line and column of a link site in its parent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SourcePosition {
    /// Zero-based line
    pub line: u32,
    /// Zero-based column, in characters
    pub column: u32,
}

impl SourcePosition {
    /// Create a position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One observed link edge in the template graph.
///
/// Created fresh from every graph notification and discarded when the next
/// notification for the same root document arrives. Only [`id`](Self::id) is
/// stable across notifications.
///
/// # Examples
///
/// ```rust
/// use armlink::links::{LinkedTemplateReference, LoadState, SourcePosition};
///
/// let mut reference = LinkedTemplateReference::new(
///     "3f1c",
///     "file:///templates/child.json",
///     SourcePosition::new(12, 20),
/// );
/// assert!(!reference.is_settled());
///
/// reference.begin_loading().unwrap();
/// reference.mark_failed("Could not find linked template file").unwrap();
/// assert_eq!(reference.load_error_message(), Some("Could not find linked template file"));
/// assert!(reference.is_settled());
///
/// // Terminal states never change again
/// assert!(reference.mark_loaded().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReferencePayload", into = "ReferencePayload")]
pub struct LinkedTemplateReference {
    /// Opaque identifier, stable across notifications for the same link
    pub id: String,
    /// Absolute, fully-resolved URI of the linked file
    pub target_uri: String,
    /// The path or expression as written in the parent template
    pub original_path: String,
    /// Position of the link site in the parent document
    pub source_position: SourcePosition,
    /// Parameter values supplied at the link site, uninterpreted
    pub parameter_values: Map<String, Value>,
    load_state: LoadState,
}

impl LinkedTemplateReference {
    /// Create a reference in the `NotLoaded` state.
    pub fn new(
        id: impl Into<String>,
        target_uri: impl Into<String>,
        source_position: SourcePosition,
    ) -> Self {
        Self {
            id: id.into(),
            target_uri: target_uri.into(),
            original_path: String::new(),
            source_position,
            parameter_values: Map::new(),
            load_state: LoadState::NotLoaded,
        }
    }

    /// Set the authored path.
    #[must_use]
    pub fn with_original_path(mut self, original_path: impl Into<String>) -> Self {
        self.original_path = original_path.into();
        self
    }

    /// Add a parameter value supplied at the link site.
    #[must_use]
    pub fn with_parameter_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameter_values.insert(name.into(), value);
        self
    }

    /// Start in the given state, as echoed by the analysis process.
    #[must_use]
    pub fn with_load_state(mut self, load_state: LoadState) -> Self {
        self.load_state = load_state;
        self
    }

    /// Current load state.
    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// The failure message; `Some` exactly when the state is `LoadFailed`.
    #[must_use]
    pub fn load_error_message(&self) -> Option<&str> {
        self.load_state.error_message()
    }

    /// Whether the reference has settled, i.e. it is neither `NotLoaded` nor
    /// `Loading`. Consumers waiting on a reference poll this.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.load_state.is_terminal()
    }

    /// `NotLoaded -> Loading`
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] from any other state.
    pub fn begin_loading(&mut self) -> Result<(), TransitionError> {
        self.transition(&[LoadState::NotLoaded], LoadState::Loading)
    }

    /// `Loading -> SuccessfullyLoaded`
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] unless the reference is `Loading`.
    pub fn mark_loaded(&mut self) -> Result<(), TransitionError> {
        self.transition(&[LoadState::Loading], LoadState::SuccessfullyLoaded)
    }

    /// `Loading -> LoadFailed(message)`
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] unless the reference is `Loading`.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(
            &[LoadState::Loading],
            LoadState::LoadFailed {
                message: message.into(),
            },
        )
    }

    /// `NotLoaded -> TooDeep`
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] unless the reference is `NotLoaded`.
    pub fn mark_too_deep(&mut self) -> Result<(), TransitionError> {
        self.transition(&[LoadState::NotLoaded], LoadState::TooDeep)
    }

    /// `NotLoaded -> NotSupported`
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] unless the reference is `NotLoaded`.
    pub fn mark_not_supported(&mut self) -> Result<(), TransitionError> {
        self.transition(&[LoadState::NotLoaded], LoadState::NotSupported)
    }

    /// Settle a `Loading` reference from a load outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] unless the reference is `Loading`.
    pub fn complete<T, E: fmt::Display>(
        &mut self,
        outcome: &Result<T, E>,
    ) -> Result<(), TransitionError> {
        match outcome {
            Ok(_) => self.mark_loaded(),
            Err(error) => self.mark_failed(error.to_string()),
        }
    }

    fn transition(&mut self, allowed_from: &[LoadState], to: LoadState) -> Result<(), TransitionError> {
        if !allowed_from.contains(&self.load_state) {
            return Err(TransitionError {
                id: self.id.clone(),
                from: self.load_state.name(),
                to: to.name(),
            });
        }
        tracing::trace!(
            id = %self.id,
            from = self.load_state.name(),
            to = to.name(),
            "linked template load state changed"
        );
        self.load_state = to;
        Ok(())
    }
}

/// Wire shape of a reference, camelCase as sent by the analysis process.
///
/// Early payloads used `fullPath`/`lineNumber`/`columnNumber`/`parameters`;
/// those names are still accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferencePayload {
    id: String,
    #[serde(alias = "fullPath")]
    full_uri: String,
    #[serde(default)]
    original_path: String,
    #[serde(alias = "lineNumber")]
    line_number_in_parent: u32,
    #[serde(alias = "columnNumber")]
    column_number_in_parent: u32,
    #[serde(default, alias = "parameters")]
    parameter_values: Map<String, Value>,
    #[serde(default)]
    load_state: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    load_error_message: Option<String>,
}

impl TryFrom<ReferencePayload> for LinkedTemplateReference {
    type Error = String;

    fn try_from(payload: ReferencePayload) -> Result<Self, Self::Error> {
        let load_state = LoadState::from_wire(payload.load_state, payload.load_error_message)?;
        Ok(Self {
            id: payload.id,
            target_uri: payload.full_uri,
            original_path: payload.original_path,
            source_position: SourcePosition::new(
                payload.line_number_in_parent,
                payload.column_number_in_parent,
            ),
            parameter_values: payload.parameter_values,
            load_state,
        })
    }
}

impl From<LinkedTemplateReference> for ReferencePayload {
    fn from(reference: LinkedTemplateReference) -> Self {
        Self {
            id: reference.id,
            full_uri: reference.target_uri,
            original_path: reference.original_path,
            line_number_in_parent: reference.source_position.line,
            column_number_in_parent: reference.source_position.column,
            parameter_values: reference.parameter_values,
            load_state: reference.load_state.code(),
            load_error_message: reference.load_state.error_message().map(str::to_string),
        }
    }
}

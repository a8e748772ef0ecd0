//! Linked template references and their load state machine.
//!
//! A linked template reference is one edge of the template graph: a link site
//! in a parent document (`templateLink` or `parametersLink` property of a
//! deployment resource) that points at another file. References are produced by
//! the analysis process, delivered in graph notifications, and attached to the
//! scopes of the parent document by the [`graph`](crate::graph) synchronizer.
//!
//! # Load states
//!
//! ```text
//!             +--> TooDeep        (terminal)
//!             |
//! NotLoaded --+--> NotSupported   (terminal)
//!             |
//!             +--> Loading --+--> SuccessfullyLoaded (terminal)
//!                            |
//!                            +--> LoadFailed(message) (terminal)
//! ```
//!
//! `TooDeep` and `NotSupported` are decided by the analysis process before a
//! load is ever attempted; armlink only echoes them. The failure message lives
//! inside [`LoadState::LoadFailed`], so a reference can never carry an error
//! message in any other state.

mod reference;

pub use reference::{LinkedTemplateReference, LoadState, SourcePosition, TransitionError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a link site.
///
/// Affects how load failures are worded: parameter links talk about a
/// "parameter file", both template link kinds about a "template file".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceKind {
    /// `templateLink.uri` pointing at an absolute location
    #[default]
    TemplateLink,
    /// `templateLink.relativePath`, resolved against the parent template
    TemplateRelativeLink,
    /// `parametersLink.uri`
    ParametersLink,
}

impl ReferenceKind {
    /// Noun used in user-facing messages.
    #[must_use]
    pub fn file_noun(self) -> &'static str {
        match self {
            ReferenceKind::ParametersLink => "parameter file",
            ReferenceKind::TemplateLink | ReferenceKind::TemplateRelativeLink => "template file",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::TemplateLink => "templateLink",
            ReferenceKind::TemplateRelativeLink => "templateRelativeLink",
            ReferenceKind::ParametersLink => "parametersLink",
        };
        f.write_str(name)
    }
}

//! Parameter definitions of linked templates.
//!
//! When a parent template links to a child, completions and signature help
//! for the link site's `parameters` object come from the child's top-level
//! `parameters` section. This module defines the parameter shape, the
//! [`ParameterDefinitionsSource`] trait implemented by loaded documents, and
//! the collaborator-facing lookup
//! [`parameter_definitions_from_linked_template`].
//!
//! The lookup is pure: it only consults the keyed cache and never triggers a
//! load. A reference whose target has not been loaded yet (or whose URI does
//! not parse) simply has no parameters.
//!
//! # Examples
//!
//! ```rust
//! use armlink::parameters::ParameterDefinition;
//! use serde_json::json;
//!
//! let template = json!({
//!     "parameters": {
//!         "location": { "type": "string", "defaultValue": "westus" },
//!         "count": { "type": "int" }
//!     }
//! });
//!
//! let definitions = ParameterDefinition::from_template(&template);
//! assert_eq!(definitions.len(), 2);
//! assert!(definitions.iter().any(|p| p.name == "location" && !p.is_required()));
//! ```

use crate::links::LinkedTemplateReference;
use crate::uri::NormalizedMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One entry of a template's top-level `parameters` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    /// Parameter name as written in the template
    pub name: String,
    /// Declared type (`string`, `int`, `securestring`, ...), empty if missing
    #[serde(rename = "type", default)]
    pub parameter_type: String,
    /// Default value, if the template declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// `metadata.description`, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterDefinition {
    /// Extract the definitions from a parsed template document.
    ///
    /// Entries that are not JSON objects are skipped. A document without a
    /// `parameters` object has no definitions.
    #[must_use]
    pub fn from_template(template: &Value) -> Vec<Self> {
        let Some(parameters) = template.get("parameters").and_then(Value::as_object) else {
            return Vec::new();
        };

        parameters
            .iter()
            .filter_map(|(name, body)| {
                let body = body.as_object()?;
                Some(Self {
                    name: name.clone(),
                    parameter_type: body
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    default_value: body.get("defaultValue").cloned(),
                    description: body
                        .get("metadata")
                        .and_then(|metadata| metadata.get("description"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect()
    }

    /// Whether a caller has to supply a value.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default_value.is_none()
    }
}

/// Anything that exposes the parameter definitions of a template.
pub trait ParameterDefinitionsSource {
    /// Top-level parameter definitions.
    fn parameter_definitions(&self) -> &[ParameterDefinition];
}

/// Parameter definitions of the template a reference points at.
///
/// Looks the reference's target up in `cache`; returns an empty list when the
/// target is not cached or its URI is invalid. Never loads anything.
#[must_use]
pub fn parameter_definitions_from_linked_template<D>(
    reference: &LinkedTemplateReference,
    cache: &NormalizedMap<Arc<D>>,
) -> Vec<ParameterDefinition>
where
    D: ParameterDefinitionsSource + ?Sized,
{
    cache
        .get(reference.target_uri.as_str())
        .map(|document| document.parameter_definitions().to_vec())
        .unwrap_or_default()
}

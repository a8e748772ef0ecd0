//! `armlink params`: list a template's parameters.

use super::uri_argument;
use crate::config::LinkConfig;
use crate::links::{LinkedTemplateReference, ReferenceKind, SourcePosition};
use crate::session::LinkSession;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// List the parameters a template declares.
#[derive(Args, Debug)]
pub struct ParamsCommand {
    /// Template to load (URI or path)
    pub template: String,

    /// Print the definitions as JSON
    #[arg(long)]
    pub json: bool,
}

impl ParamsCommand {
    /// Load the template and print its parameter definitions.
    ///
    /// # Errors
    ///
    /// Fails when the template cannot be opened.
    pub async fn execute(self, config: LinkConfig) -> Result<()> {
        let uri = uri_argument(&self.template)?;
        let session = LinkSession::new(config);

        session
            .loader()
            .open_uri(&uri, ReferenceKind::TemplateLink)
            .await
            .with_context(|| format!("Failed to load {uri}"))?;

        // Same lookup a completion provider performs for a link site
        let reference = LinkedTemplateReference::new("cli", uri.as_str(), SourcePosition::default());
        let mut definitions = session.parameter_definitions_for(&reference);
        definitions.sort_by(|a, b| a.name.cmp(&b.name));

        if self.json {
            println!("{}", serde_json::to_string_pretty(&definitions)?);
            return Ok(());
        }

        if definitions.is_empty() {
            println!("{}", "No parameters declared".dimmed());
            return Ok(());
        }

        println!("{} ({} parameters)", uri.to_string().bold(), definitions.len());
        for definition in &definitions {
            let requirement = match &definition.default_value {
                None => "required".yellow().to_string(),
                Some(value) => format!("default {value}").dimmed().to_string(),
            };
            print!("  {} {} {}", definition.name.cyan(), definition.parameter_type, requirement);
            if let Some(description) = &definition.description {
                print!(" - {description}");
            }
            println!();
        }
        Ok(())
    }
}

//! `armlink open`: run one OpenLinkedFile request.

use super::uri_argument;
use crate::config::LinkConfig;
use crate::links::ReferenceKind;
use crate::resolver::OpenLinkedFileRequest;
use crate::session::LinkSession;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

/// Send an OpenLinkedFile request for a linked file.
#[derive(Args, Debug)]
pub struct OpenCommand {
    /// Document containing the link (URI or path)
    pub source: String,

    /// Resolved link target (URI or path)
    pub resolved: String,

    /// Link target as authored in the source document
    #[arg(long)]
    pub original: Option<String>,

    /// Kind of link site
    #[arg(long, value_enum, default_value_t = ReferenceKind::TemplateLink)]
    pub kind: ReferenceKind,

    /// Print the response as JSON and always exit successfully
    #[arg(long)]
    pub json: bool,
}

impl OpenCommand {
    /// Run the request against a fresh session.
    ///
    /// # Errors
    ///
    /// Fails when an argument is not a URI or path, or (without `--json`)
    /// when the file could not be opened.
    pub async fn execute(self, config: LinkConfig) -> Result<()> {
        let source = uri_argument(&self.source)?;
        let resolved = uri_argument(&self.resolved)?;

        let request = OpenLinkedFileRequest {
            source_document_uri: source.to_string(),
            requested_link_original_uri: self.original.unwrap_or_else(|| self.resolved.clone()),
            requested_link_resolved_uri: resolved.to_string(),
            reference_kind: self.kind,
        };

        let session = LinkSession::new(config);
        let response = session.on_request_open_linked_file(&request).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        match response.load_error_message {
            None => {
                println!("{} Opened linked {} {}", "✓".green(), self.kind.file_noun(), resolved);
                Ok(())
            }
            Some(message) => bail!(message),
        }
    }
}

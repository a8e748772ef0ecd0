//! `armlink sync`: apply a graph notification to a scope tree.

use crate::config::LinkConfig;
use crate::core::ArmlinkError;
use crate::graph::{NotifyTemplateGraphArgs, SyncOutcome, SyncReport};
use crate::links::LinkedTemplateReference;
use crate::scope::{ScopeTree, ScopeTreeDefinition, Span};
use crate::session::LinkSession;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;

/// Apply a template graph notification to a scope tree.
#[derive(Args, Debug)]
pub struct SyncCommand {
    /// Scope tree JSON (`documentUri`, `scopes`, optional `text`)
    #[arg(long)]
    pub tree: PathBuf,

    /// NotifyTemplateGraph JSON (`rootTemplateUri`, `linkedTemplates`)
    #[arg(long)]
    pub notification: PathBuf,

    /// Template text, when the scope tree does not embed it
    #[arg(long)]
    pub text: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncSummary {
    report: SyncReport,
    scopes: Vec<ScopeSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScopeSummary {
    name: Option<String>,
    span: Span,
    linked_templates: Vec<LinkedTemplateReference>,
}

impl SyncCommand {
    /// Build the tree, apply the notification, and print the attachments.
    ///
    /// # Errors
    ///
    /// Fails when an input file cannot be read or parsed, the tree is
    /// malformed, or the notification is for a different document.
    pub async fn execute(self, config: LinkConfig) -> Result<()> {
        let definition: ScopeTreeDefinition = read_json(&self.tree, "scope tree").await?;
        let args: NotifyTemplateGraphArgs = read_json(&self.notification, "notification").await?;

        let text = match &self.text {
            Some(path) => Some(
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            ),
            None => None,
        };
        let tree = match &text {
            Some(text) => definition.build(text),
            None => definition.build_embedded(),
        }
        .map_err(ArmlinkError::from)?;

        let session = LinkSession::new(config);
        let shared = session.register_scope_tree(tree);
        let root = args.root_template_uri.clone();

        let report = match session.on_notify_template_graph(args)? {
            SyncOutcome::Applied(report) => report,
            SyncOutcome::NoScopeTree => {
                return Err(ArmlinkError::ScopeTreeNotFound { uri: root }.into());
            }
            SyncOutcome::Stale => {
                return Err(ArmlinkError::StaleNotification { uri: root }.into());
            }
        };

        let tree = shared.read().unwrap_or_else(PoisonError::into_inner);
        let summary = summarize(report, &tree);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| {
        ArmlinkError::InvalidPayload {
            what: what.to_string(),
            file: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn summarize(report: SyncReport, tree: &ScopeTree) -> SyncSummary {
    let scopes = tree
        .linked_deployment_scopes()
        .into_iter()
        .map(|id| {
            let scope = tree.scope(id);
            ScopeSummary {
                name: scope.name().map(str::to_string),
                span: scope.span(),
                linked_templates: scope.linked_file_references().to_vec(),
            }
        })
        .collect();
    SyncSummary { report, scopes }
}

fn print_summary(summary: &SyncSummary) {
    for scope in &summary.scopes {
        let name = scope.name.as_deref().unwrap_or("<unnamed>");
        println!("{} {}", name.bold(), scope.span.to_string().dimmed());
        if scope.linked_templates.is_empty() {
            println!("  {}", "no linked templates".dimmed());
        }
        for reference in &scope.linked_templates {
            let state = match reference.load_error_message() {
                Some(message) => format!("{}: {message}", reference.load_state().name()).red(),
                None => reference.load_state().name().green(),
            };
            println!("  {} {} ({})", reference.id, reference.target_uri, state);
        }
    }

    println!(
        "Attached {}, dropped {} across {} template link(s)",
        summary.report.attached, summary.report.dropped, summary.report.candidate_scopes
    );
}

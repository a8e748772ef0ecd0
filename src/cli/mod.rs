//! Command-line interface for armlink.
//!
//! The `armlink` binary is a diagnostic front end over a
//! [`LinkSession`](crate::session::LinkSession). It runs the same code paths a
//! language-server host would, one message at a time:
//!
//! - `open` - send an OpenLinkedFile request and print the outcome
//! - `sync` - apply a graph notification to a scope tree and print which
//!   references ended up on which template-link resource
//! - `params` - load a template and list the parameters it declares
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - no logging at all
//! - `--config` / `-c` - configuration file instead of `~/.armlink/config.toml`
//!
//! # Examples
//!
//! ```bash
//! # A relative link that cannot be found
//! armlink open file:///t/main.json file:///t/missing.json --kind template-relative-link
//!
//! # Local paths are accepted wherever a URI is expected
//! armlink params ./templates/child.json --json
//!
//! # Debug output while synchronizing
//! armlink -v sync --tree tree.json --notification graph.json
//! ```

mod open;
mod params;
mod sync;

#[cfg(test)]
mod tests;

pub use open::OpenCommand;
pub use params::ParamsCommand;
pub use sync::SyncCommand;

use crate::config::LinkConfig;
use crate::uri::NormalizedUri;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can build one directly.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive, `None` for no logging
    pub log_level: Option<String>,

    /// Configuration file given with `--config`
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create a configuration with no logging and the default config path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log filter directive.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Install a stderr subscriber for the configured level.
    ///
    /// `RUST_LOG` takes precedence over the level chosen by the flags. Does
    /// nothing when logging is disabled or a subscriber is already installed.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the [`LinkConfig`] for this run.
    ///
    /// # Errors
    ///
    /// See [`LinkConfig::load_with_optional`].
    pub async fn load_link_config(&self) -> Result<LinkConfig> {
        LinkConfig::load_with_optional(self.config_path.clone()).await
    }
}

/// Linked template graph tooling for ARM deployment templates
#[derive(Parser)]
#[command(
    name = "armlink",
    about = "Resolve linked ARM templates and synchronize their reference graph",
    version,
    long_about = "armlink opens linked deployment templates and attaches the linked-template graph reported by a template analyzer to the scope tree of the root document."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging. Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging; only errors and command output are printed.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a configuration file (default `~/.armlink/config.toml`).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Send an OpenLinkedFile request for a linked file
    Open(OpenCommand),

    /// Apply a template graph notification to a scope tree
    Sync(SyncCommand),

    /// List the parameters a template declares
    Params(ParamsCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Returns whatever the command fails with; `main` renders it through
    /// [`user_friendly_error`](crate::core::user_friendly_error).
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    ///
    /// `--verbose` selects `debug`, `--quiet` disables logging, and the
    /// default is `info`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Fails when the configuration cannot be loaded or the command fails.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let link_config = config.load_link_config().await?;

        match self.command {
            Commands::Open(cmd) => cmd.execute(link_config).await,
            Commands::Sync(cmd) => cmd.execute(link_config).await,
            Commands::Params(cmd) => cmd.execute(link_config).await,
        }
    }
}

/// Accept either an absolute URI or a local path, relative paths being
/// resolved against the working directory.
pub(crate) fn uri_argument(text: &str) -> Result<NormalizedUri> {
    // A one-letter scheme is a Windows drive, not a URI
    match NormalizedUri::parse(text) {
        Ok(uri) if uri.scheme().len() > 1 => return Ok(uri),
        _ => {}
    }

    let path = PathBuf::from(text);
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("Failed to determine the current directory")?
            .join(path)
    };
    NormalizedUri::from_file_path(&path)
        .with_context(|| format!("'{text}' is neither an absolute URI nor a usable path"))
}

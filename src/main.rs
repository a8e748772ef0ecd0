//! armlink CLI entry point
//!
//! Parses arguments, runs the command, and renders failures with
//! suggestions before exiting with status 1.
//!
//! - `open` - run an OpenLinkedFile request
//! - `sync` - apply a template graph notification to a scope tree
//! - `params` - list a template's parameter definitions

use anyhow::Result;
use armlink::cli;
use armlink::core::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}

//! Integration test suite for armlink
//!
//! End-to-end tests of the `armlink` binary and of a [`LinkSession`] driven
//! the way a language-server host drives it.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli_open**: `armlink open` against present and missing files
//! - **cli_params**: `armlink params` output
//! - **cli_sync**: `armlink sync` with scope-tree and notification files
//! - **config**: configuration file and environment handling
//! - **session**: open requests and graph notifications through one session
//!
//! [`LinkSession`]: armlink::session::LinkSession

use assert_cmd::Command;
use std::path::Path;

mod cli_open;
mod cli_params;
mod cli_sync;
mod config;
mod session;

/// An `armlink` command isolated from the user's home directory and
/// environment overrides.
pub fn armlink(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("armlink").unwrap();
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG")
        .env_remove("ARMLINK_DEDUPE_OPENS")
        .env_remove("ARMLINK_DISCARD_STALE")
        .env_remove("ARMLINK_OPEN_TIMEOUT_MS");
    cmd
}

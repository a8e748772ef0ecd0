//! Runtime configuration for armlink.
//!
//! Configuration is layered, later layers winning:
//!
//! 1. Built-in defaults ([`LinkConfig::default`])
//! 2. A TOML file: the `--config` path, else `~/.armlink/config.toml`
//! 3. Environment variables ([`ENV_DEDUPE_OPENS`], [`ENV_DISCARD_STALE`],
//!    [`ENV_OPEN_TIMEOUT_MS`])
//!
//! A missing file is not an error; a malformed one is.
//!
//! # File Format
//!
//! ```toml
//! # Serialize concurrent opens of the same linked file
//! dedupe_concurrent_opens = true
//!
//! # Ignore graph notifications older than the last one applied
//! discard_stale_snapshots = true
//!
//! # Give up on a document-store load after this many milliseconds
//! open_timeout_ms = 5000
//! ```

use crate::core::ArmlinkError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Overrides [`LinkConfig::dedupe_concurrent_opens`]
pub const ENV_DEDUPE_OPENS: &str = "ARMLINK_DEDUPE_OPENS";
/// Overrides [`LinkConfig::discard_stale_snapshots`]
pub const ENV_DISCARD_STALE: &str = "ARMLINK_DISCARD_STALE";
/// Overrides [`LinkConfig::open_timeout_ms`]
pub const ENV_OPEN_TIMEOUT_MS: &str = "ARMLINK_OPEN_TIMEOUT_MS";

/// Settings shared by the loader and the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Serialize concurrent opens of the same file so the store loads it once.
    pub dedupe_concurrent_opens: bool,

    /// Drop graph notifications whose sequence number is not newer than the
    /// last one applied for the same root.
    pub discard_stale_snapshots: bool,

    /// Timeout for one document-store load. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_timeout_ms: Option<u64>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            dedupe_concurrent_opens: true,
            discard_stale_snapshots: true,
            open_timeout_ms: None,
        }
    }
}

impl LinkConfig {
    /// Load configuration with all layers applied.
    ///
    /// Reads `path` if given, else the default location; a file that does not
    /// exist leaves the defaults in place. Environment overrides are applied
    /// last.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, or an environment
    /// variable holds an invalid value.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path),
            None => Self::default_path().ok(),
        };

        let mut config = match path {
            Some(path) if path.exists() => Self::load_from(&path).await?,
            _ => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid TOML for this struct.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// `~/.armlink/config.toml`.
    ///
    /// # Errors
    ///
    /// Fails when the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
        Ok(home.join(".armlink").join("config.toml"))
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`apply_overrides_from`](Self::apply_overrides_from).
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Booleans accept `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`. An
    /// empty timeout clears it.
    ///
    /// # Errors
    ///
    /// Returns [`ArmlinkError::ConfigError`] for values that do not parse.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup(ENV_DEDUPE_OPENS) {
            self.dedupe_concurrent_opens = parse_bool(ENV_DEDUPE_OPENS, &value)?;
        }
        if let Some(value) = lookup(ENV_DISCARD_STALE) {
            self.discard_stale_snapshots = parse_bool(ENV_DISCARD_STALE, &value)?;
        }
        if let Some(value) = lookup(ENV_OPEN_TIMEOUT_MS) {
            let value = value.trim();
            self.open_timeout_ms = if value.is_empty() {
                None
            } else {
                Some(value.parse().map_err(|_| ArmlinkError::ConfigError {
                    message: format!("{ENV_OPEN_TIMEOUT_MS} must be a number of milliseconds, got '{value}'"),
                })?)
            };
        }
        Ok(())
    }

    /// [`open_timeout_ms`](Self::open_timeout_ms) as a [`Duration`].
    #[must_use]
    pub fn open_timeout(&self) -> Option<Duration> {
        self.open_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ArmlinkError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ArmlinkError::ConfigError {
            message: format!("{name} must be a boolean, got '{other}'"),
        }),
    }
}

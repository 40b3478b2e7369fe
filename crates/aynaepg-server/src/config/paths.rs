//! Config file path resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Resolves the config file path.
///
/// - If `explicit` is `Some`, returns it unchanged.
/// - Otherwise returns `~/.config/aynaepg/config.toml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when
/// `explicit` is `None`).
pub fn resolve_config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("aynaepg")
        .join("config.toml"))
}

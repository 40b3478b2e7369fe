//! Application configuration module.
//!
//! Manages the optional TOML config file holding upstream endpoints,
//! timeouts, cache lifetime and the listen port.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, DEFAULT_PORT, resolve_port};
pub use paths::resolve_config_path;

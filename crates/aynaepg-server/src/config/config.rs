//! `AppConfig` struct and TOML loading.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use aynaepg_api::ayna::{
    AynaClient, DEFAULT_FEED_URL_TEMPLATE, DEFAULT_METADATA_URL, validate_template,
};
use aynaepg_cache::DEFAULT_TTL;
use serde::{Deserialize, Serialize};
use url::Url;

/// Port used when neither the command line, `PORT`, nor the config file
/// sets one.
pub const DEFAULT_PORT: u16 = 3000;

/// Default upstream request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default User-Agent sent upstream.
const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP server configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen port.
    pub port: Option<u16>,
}

/// Upstream API configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Channel directory URL.
    pub metadata_url: String,
    /// EPG feed URL template containing `{date}`.
    pub feed_url_template: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            metadata_url: String::from(DEFAULT_METADATA_URL),
            feed_url_template: String::from(DEFAULT_FEED_URL_TEMPLATE),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: String::from(DEFAULT_USER_AGENT),
        }
    }
}

impl UpstreamConfig {
    /// Builds the upstream API client.
    ///
    /// # Errors
    ///
    /// Returns an error if `metadata_url` is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn build_client(&self) -> Result<AynaClient> {
        let metadata_url = parse_metadata_url(&self.metadata_url)?;
        AynaClient::builder()
            .metadata_url(metadata_url)
            .user_agent(self.user_agent.as_str())
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }
}

/// Result cache configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Time-to-live of the cached document in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    /// TTL as a `Duration`.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is malformed, the feed template lacks the
    /// date placeholder, or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        parse_metadata_url(&self.upstream.metadata_url)?;
        validate_template(&self.upstream.feed_url_template)
            .context("invalid upstream.feed_url_template")?;
        if self.upstream.timeout_secs == 0 {
            bail!("upstream.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

/// Parses the `upstream.metadata_url` setting.
fn parse_metadata_url(raw: &str) -> Result<Url> {
    Url::parse(raw)
        .with_context(|| format!("invalid upstream.metadata_url: {raw}"))
}

/// Picks the listen port: command line or `PORT`, then config, then
/// [`DEFAULT_PORT`].
#[must_use]
pub fn resolve_port(cli_port: Option<u16>, config_port: Option<u16>) -> u16 {
    cli_port.or(config_port).unwrap_or(DEFAULT_PORT)
}

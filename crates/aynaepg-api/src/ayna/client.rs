//! `AynaClient` - Ayna upstream API client implementation.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::api::AynaApi;
use super::types::{ChannelDirectory, ChannelDirectoryResponse, RawChannelFeed};

/// Default channel directory URL.
pub const DEFAULT_METADATA_URL: &str = "https://epg.aynaott.com/api/channels.json";

/// Default timeout applied to every upstream request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum number of body bytes included in decode error messages.
const BODY_PREVIEW_LEN: usize = 500;

/// Ayna upstream API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct AynaClient {
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
    /// Channel directory URL.
    metadata_url: Url,
}

/// Builder for `AynaClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct AynaClientBuilder {
    metadata_url: Option<Url>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl AynaClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            metadata_url: None,
            user_agent: None,
            timeout: None,
        }
    }

    /// Overrides the channel directory URL (also used for wiremock in tests).
    #[must_use]
    pub fn metadata_url(mut self, url: Url) -> Self {
        self.metadata_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the per-request timeout (default: 15s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<AynaClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;

        let metadata_url = if let Some(url) = self.metadata_url {
            url
        } else {
            let result = Url::parse(DEFAULT_METADATA_URL);
            result.context("invalid default metadata URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .context("failed to build HTTP client")?;

        Ok(AynaClient {
            http_client,
            metadata_url,
        })
    }
}

impl AynaClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> AynaClientBuilder {
        AynaClientBuilder::new()
    }

    /// Returns the channel directory URL.
    #[must_use]
    pub const fn metadata_url(&self) -> &Url {
        &self.metadata_url
    }

    /// Builds a JSON decode error message with a preview of the response body.
    fn json_decode_error(url: &Url, body: &str) -> String {
        format!(
            "failed to decode JSON response from {url} (len={}): {}",
            body.len(),
            &body[..body.floor_char_boundary(BODY_PREVIEW_LEN)]
        )
    }

    /// Sends a single GET request and decodes the JSON body.
    ///
    /// Non-success statuses are errors. There is no retry: a failed fetch is
    /// treated as absent data until the next rebuild.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "Upstream request");

        let result = self.http_client.get(url.clone()).send().await;
        let response = result.with_context(|| format!("request failed: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("upstream error (HTTP {status}): {url}");
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body: {url}"))?;

        tracing::debug!(%url, body_len = body.len(), "Response body received");

        let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
        raw_result.with_context(|| Self::json_decode_error(&url, &body))
    }
}

impl AynaApi for AynaClient {
    #[instrument(skip_all, fields(url = %self.metadata_url))]
    async fn fetch_channel_directory(&self) -> Result<ChannelDirectory> {
        let response: ChannelDirectoryResponse = self.get_json(self.metadata_url.clone()).await?;
        let directory = ChannelDirectory::from(response);
        tracing::debug!(channels = directory.len(), "Channel directory fetched");
        Ok(directory)
    }

    #[instrument(skip(self))]
    async fn fetch_feed(&self, url: &str) -> Result<Vec<RawChannelFeed>> {
        let parsed = Url::parse(url).with_context(|| format!("invalid feed URL: {url}"))?;
        let feeds: Vec<RawChannelFeed> = self.get_json(parsed).await?;
        tracing::debug!(channels = feeds.len(), "Feed fetched");
        Ok(feeds)
    }
}

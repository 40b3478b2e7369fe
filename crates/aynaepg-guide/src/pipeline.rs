//! End-to-end guide build: channel directory, feeds, XMLTV.

use anyhow::{Context, Result};
use aynaepg_api::ayna::AynaApi;
use tracing::instrument;

use crate::merge::{EpgDocument, collect_epg};
use crate::xmltv::write_document;

/// Fetches the channel directory, then every feed URL, and merges them.
///
/// # Errors
///
/// Returns an error if the channel directory cannot be fetched. Feed
/// failures are not errors; those feeds are skipped.
#[instrument(skip_all)]
pub async fn build_epg_document(
    api: &(impl AynaApi + Sync),
    feed_urls: &[String],
) -> Result<EpgDocument> {
    let directory = api
        .fetch_channel_directory()
        .await
        .context("failed to fetch channel directory")?;
    tracing::debug!(channels = directory.len(), "Channel directory loaded");

    Ok(collect_epg(api, feed_urls, &directory).await)
}

/// Builds the guide and serializes it as XMLTV.
///
/// # Errors
///
/// Returns an error if the channel directory cannot be fetched or XML
/// serialization fails.
pub async fn build_epg_xml(api: &(impl AynaApi + Sync), feed_urls: &[String]) -> Result<String> {
    let doc = build_epg_document(api, feed_urls).await?;
    write_document(&doc).context("failed to serialize XMLTV document")
}

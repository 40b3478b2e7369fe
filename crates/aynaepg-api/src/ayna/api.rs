//! `AynaApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{ChannelDirectory, RawChannelFeed};

/// Ayna upstream API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(AynaApi: Send)]
pub trait LocalAynaApi {
    /// Fetches the channel directory (id -> name, category, logo).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server answers with a
    /// non-success status, or the JSON payload cannot be decoded.
    async fn fetch_channel_directory(&self) -> Result<ChannelDirectory>;

    /// Fetches the raw per-channel program lists from one feed URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server answers with a
    /// non-success status, or the JSON payload is not an array of feeds.
    async fn fetch_feed(&self, url: &str) -> Result<Vec<RawChannelFeed>>;
}

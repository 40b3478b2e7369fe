//! Ayna upstream API client module.
//!
//! Handles HTTP requests to the channel directory endpoint and the
//! date-templated EPG feed endpoint, and decodes their JSON payloads.

mod api;
mod client;
mod types;
mod urls;
pub(crate) mod wire;

#[allow(clippy::module_name_repetitions)]
pub use api::{AynaApi, LocalAynaApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{AynaClient, AynaClientBuilder, DEFAULT_METADATA_URL};
pub use types::{
    ChannelDirectory, ChannelDirectoryResponse, ChannelMetadata, DirectoryChannel, RawChannelFeed,
    RawProgram,
};
pub use urls::{
    DATE_PLACEHOLDER, DEFAULT_FEED_URL_TEMPLATE, FEED_DAYS, feed_urls, feed_urls_for_today,
    validate_template,
};

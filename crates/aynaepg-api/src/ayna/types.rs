//! Upstream payload types and the decoded channel directory.

use std::collections::HashMap;

use serde::Deserialize;

use super::wire::{
    deserialize_null_as_empty_vec, deserialize_scalar_as_non_empty_string,
    deserialize_scalar_as_string,
};

/// Channel directory response (`{ "channels": [...] }`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChannelDirectoryResponse {
    /// Directory entries.
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub channels: Vec<DirectoryChannel>,
}

/// One entry of the channel directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectoryChannel {
    /// Channel ID.
    #[serde(default, deserialize_with = "deserialize_scalar_as_non_empty_string")]
    pub id: Option<String>,
    /// Channel display name.
    #[serde(default, deserialize_with = "deserialize_scalar_as_non_empty_string")]
    pub name: Option<String>,
    /// Category label.
    #[serde(
        rename = "categoryName",
        default,
        deserialize_with = "deserialize_scalar_as_non_empty_string"
    )]
    pub category_name: Option<String>,
    /// Logo URL.
    #[serde(default, deserialize_with = "deserialize_scalar_as_non_empty_string")]
    pub logo: Option<String>,
}

/// One program as delivered by the EPG feed.
///
/// Start and end are kept as raw text; validation happens during merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawProgram {
    /// Start time in epoch seconds (`s`).
    #[serde(rename = "s", default, deserialize_with = "deserialize_scalar_as_string")]
    pub start: Option<String>,
    /// End time in epoch seconds (`e`).
    #[serde(rename = "e", default, deserialize_with = "deserialize_scalar_as_string")]
    pub end: Option<String>,
    /// Program title (`n`).
    #[serde(rename = "n", default, deserialize_with = "deserialize_scalar_as_string")]
    pub title: Option<String>,
    /// Program description (`d`).
    #[serde(rename = "d", default, deserialize_with = "deserialize_scalar_as_string")]
    pub description: Option<String>,
}

/// Per-channel program list from one EPG feed URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawChannelFeed {
    /// Channel ID (`i`).
    #[serde(rename = "i", default, deserialize_with = "deserialize_scalar_as_non_empty_string")]
    pub channel_id: Option<String>,
    /// Channel name as known to the feed (`n`).
    #[serde(rename = "n", default, deserialize_with = "deserialize_scalar_as_non_empty_string")]
    pub channel_name: Option<String>,
    /// Programs (`epg`), in upstream order.
    #[serde(rename = "epg", default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub programs: Vec<RawProgram>,
}

/// Channel metadata from the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMetadata {
    /// Channel ID.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Category label.
    pub category: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
}

/// Channel ID to metadata lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDirectory {
    entries: HashMap<String, ChannelMetadata>,
}

impl ChannelDirectory {
    /// Looks up a channel by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChannelMetadata> {
        self.entries.get(id)
    }

    /// Number of channels in the directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ChannelMetadata> for ChannelDirectory {
    /// Later entries with the same ID replace earlier ones.
    fn from_iter<I: IntoIterator<Item = ChannelMetadata>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }
}

impl From<ChannelDirectoryResponse> for ChannelDirectory {
    /// Entries without an ID are dropped.
    fn from(response: ChannelDirectoryResponse) -> Self {
        response
            .channels
            .into_iter()
            .filter_map(|ch| {
                Some(ChannelMetadata {
                    id: ch.id?,
                    name: ch.name,
                    category: ch.category_name,
                    logo_url: ch.logo,
                })
            })
            .collect()
    }
}

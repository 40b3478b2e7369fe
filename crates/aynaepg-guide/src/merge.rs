//! Merging of per-day feeds into channel and programme records.
//!
//! Channels are deduplicated across every feed of one rebuild: the first
//! feed entry carrying an ID creates the channel, later entries with the
//! same ID only contribute programmes. When the channel directory knows the
//! ID, its name, category and logo take precedence over the feed's own name.

use std::collections::HashSet;

use anyhow::Result;
use aynaepg_api::ayna::{AynaApi, ChannelDirectory, RawChannelFeed, RawProgram};
use futures::future::join_all;
use tracing::instrument;

use crate::time::{format_epoch_secs, parse_epoch};
use crate::validate::validate_program;

/// Channel ID used when a feed entry has none.
pub const UNKNOWN_CHANNEL_ID: &str = "unknown_id";

/// Channel name used when a feed entry has none.
pub const UNKNOWN_CHANNEL_NAME: &str = "unknown_name";

/// A deduplicated channel ready for XMLTV output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedChannel {
    /// Channel ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Category label.
    pub category: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
}

/// A validated programme ready for XMLTV output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedProgramme {
    /// Owning channel ID.
    pub channel_id: String,
    /// XMLTV start timestamp.
    pub start: String,
    /// XMLTV stop timestamp.
    pub stop: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
}

/// Merged guide: all channels, then all programmes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpgDocument {
    /// Channels in first-seen order.
    pub channels: Vec<MergedChannel>,
    /// Programmes in feed order, ascending start time within each channel
    /// entry of a feed.
    pub programmes: Vec<MergedProgramme>,
}

/// Result of fetching one feed URL.
#[derive(Debug)]
pub struct FeedFetch {
    /// Feed URL.
    pub url: String,
    /// Decoded feed, or the fetch error.
    pub outcome: Result<Vec<RawChannelFeed>>,
}

/// Set of channels registered during one merge.
///
/// [`ChannelRegistry::register`] is the only way a channel enters the
/// output, so the first-seen rule is enforced in one place.
#[derive(Debug)]
pub struct ChannelRegistry<'a> {
    directory: &'a ChannelDirectory,
    seen: HashSet<String>,
    channels: Vec<MergedChannel>,
}

impl<'a> ChannelRegistry<'a> {
    /// Creates an empty registry backed by `directory`.
    #[must_use]
    pub fn new(directory: &'a ChannelDirectory) -> Self {
        Self {
            directory,
            seen: HashSet::new(),
            channels: Vec::new(),
        }
    }

    /// Registers a channel unless its ID was already seen.
    ///
    /// Returns `true` when a new channel was created.
    pub fn register(&mut self, id: &str, feed_name: &str) -> bool {
        if !self.seen.insert(String::from(id)) {
            return false;
        }

        let metadata = self.directory.get(id);
        let display_name = metadata
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| String::from(feed_name));

        self.channels.push(MergedChannel {
            id: String::from(id),
            display_name,
            category: metadata.and_then(|m| m.category.clone()),
            logo_url: metadata.and_then(|m| m.logo_url.clone()),
        });
        true
    }

    /// Whether `id` has been registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Consumes the registry, returning channels in registration order.
    #[must_use]
    pub fn into_channels(self) -> Vec<MergedChannel> {
        self.channels
    }
}

/// Sort key for a raw program: numeric start, unparseable starts last.
fn start_sort_key(program: &RawProgram) -> (bool, i64) {
    program
        .start
        .as_deref()
        .and_then(parse_epoch)
        .map_or((true, 0), |start| (false, start))
}

/// Sorts, validates and formats one channel's programs into `out`.
///
/// Returns the number of programs dropped.
fn merge_programs(
    channel_id: &str,
    mut programs: Vec<RawProgram>,
    out: &mut Vec<MergedProgramme>,
) -> usize {
    programs.sort_by_key(start_sort_key);

    let mut dropped = 0usize;
    for program in programs {
        let Some(window) = validate_program(program.start.as_deref(), program.end.as_deref())
        else {
            tracing::debug!(
                channel_id,
                start = ?program.start,
                end = ?program.end,
                "Dropping program with invalid time window"
            );
            dropped = dropped.saturating_add(1);
            continue;
        };

        let (Some(start), Some(stop)) = (
            format_epoch_secs(window.start),
            format_epoch_secs(window.end),
        ) else {
            tracing::debug!(
                channel_id,
                start = window.start,
                end = window.end,
                "Dropping program with unformattable time"
            );
            dropped = dropped.saturating_add(1);
            continue;
        };

        out.push(MergedProgramme {
            channel_id: String::from(channel_id),
            start,
            stop,
            title: program.title.unwrap_or_default(),
            description: program.description.unwrap_or_default(),
        });
    }
    dropped
}

/// Merges feed fetch outcomes, in URL order, into one document.
///
/// Failed fetches are logged and skipped; the remaining feeds still
/// contribute.
#[must_use]
pub fn merge_feeds(
    directory: &ChannelDirectory,
    fetches: impl IntoIterator<Item = FeedFetch>,
) -> EpgDocument {
    let mut registry = ChannelRegistry::new(directory);
    let mut programmes = Vec::new();
    let mut skipped_feeds = 0usize;
    let mut dropped_programs = 0usize;

    for fetch in fetches {
        let feeds = match fetch.outcome {
            Ok(feeds) => feeds,
            Err(e) => {
                tracing::warn!(
                    url = %fetch.url,
                    error = ?e,
                    "Skipping EPG feed that failed to load"
                );
                skipped_feeds = skipped_feeds.saturating_add(1);
                continue;
            }
        };

        for feed in feeds {
            let id = feed.channel_id.as_deref().unwrap_or(UNKNOWN_CHANNEL_ID);
            let name = feed.channel_name.as_deref().unwrap_or(UNKNOWN_CHANNEL_NAME);
            registry.register(id, name);

            let dropped = merge_programs(id, feed.programs, &mut programmes);
            dropped_programs = dropped_programs.saturating_add(dropped);
        }
    }

    let channels = registry.into_channels();
    tracing::info!(
        channels = channels.len(),
        programmes = programmes.len(),
        dropped_programs,
        skipped_feeds,
        "EPG merge completed"
    );

    EpgDocument {
        channels,
        programmes,
    }
}

/// Fetches every feed URL and merges the results.
///
/// Fetches run concurrently; merging happens afterwards in URL order on a
/// single task.
#[instrument(skip_all, fields(feeds = urls.len()))]
pub async fn collect_epg(
    api: &(impl AynaApi + Sync),
    urls: &[String],
    directory: &ChannelDirectory,
) -> EpgDocument {
    let outcomes = join_all(urls.iter().map(|url| api.fetch_feed(url))).await;
    let fetches = urls
        .iter()
        .zip(outcomes)
        .map(|(url, outcome)| FeedFetch {
            url: url.clone(),
            outcome,
        });
    merge_feeds(directory, fetches)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use anyhow::anyhow;
    use aynaepg_api::ayna::ChannelMetadata;
    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    fn program(start: &str, end: &str, title: &str) -> RawProgram {
        RawProgram {
            start: Some(String::from(start)),
            end: Some(String::from(end)),
            title: Some(String::from(title)),
            description: Some(format!("{title} desc")),
        }
    }

    fn feed(id: &str, name: &str, programs: Vec<RawProgram>) -> RawChannelFeed {
        RawChannelFeed {
            channel_id: Some(String::from(id)),
            channel_name: Some(String::from(name)),
            programs,
        }
    }

    fn ok(url: &str, feeds: Vec<RawChannelFeed>) -> FeedFetch {
        FeedFetch {
            url: String::from(url),
            outcome: Ok(feeds),
        }
    }

    fn failed(url: &str) -> FeedFetch {
        FeedFetch {
            url: String::from(url),
            outcome: Err(anyhow!("connection refused")),
        }
    }

    fn directory_with_c1() -> ChannelDirectory {
        std::iter::once(ChannelMetadata {
            id: String::from("c1"),
            name: Some(String::from("Channel One")),
            category: Some(String::from("News")),
            logo_url: Some(String::from("http://x/logo.png")),
        })
        .collect()
    }

    #[test]
    fn test_registry_first_registration_wins() {
        // Arrange
        let directory = ChannelDirectory::default();
        let mut registry = ChannelRegistry::new(&directory);

        // Act
        let first = registry.register("c2", "First Name");
        let second = registry.register("c2", "Second Name");

        // Assert
        assert!(first);
        assert!(!second);
        assert!(registry.contains("c2"));
        let channels = registry.into_channels();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].display_name, "First Name");
        assert_eq!(channels[0].category, None);
        assert_eq!(channels[0].logo_url, None);
    }

    #[test]
    fn test_registry_metadata_overrides_feed_name() {
        // Arrange
        let directory = directory_with_c1();
        let mut registry = ChannelRegistry::new(&directory);

        // Act
        registry.register("c1", "C1");

        // Assert
        let channels = registry.into_channels();
        assert_eq!(
            channels[0],
            MergedChannel {
                id: String::from("c1"),
                display_name: String::from("Channel One"),
                category: Some(String::from("News")),
                logo_url: Some(String::from("http://x/logo.png")),
            }
        );
    }

    #[test]
    fn test_registry_metadata_without_name_falls_back_to_feed() {
        // Arrange
        let directory: ChannelDirectory = std::iter::once(ChannelMetadata {
            id: String::from("c3"),
            name: None,
            category: Some(String::from("Sports")),
            logo_url: None,
        })
        .collect();
        let mut registry = ChannelRegistry::new(&directory);

        // Act
        registry.register("c3", "Feed Name");

        // Assert
        let channels = registry.into_channels();
        assert_eq!(channels[0].display_name, "Feed Name");
        assert_eq!(channels[0].category.as_deref(), Some("Sports"));
    }

    #[test]
    fn test_merge_single_program() {
        // Arrange
        let directory = directory_with_c1();
        let fetches = vec![
            ok(
                "u1",
                vec![feed(
                    "c1",
                    "C1",
                    vec![program("1700000000", "1700003600", "Show A")],
                )],
            ),
            ok("u2", vec![]),
            ok("u3", vec![]),
        ];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert
        assert_eq!(doc.channels.len(), 1);
        assert_eq!(doc.channels[0].display_name, "Channel One");
        assert_eq!(
            doc.programmes,
            vec![MergedProgramme {
                channel_id: String::from("c1"),
                start: String::from("20231115041320 +0600"),
                stop: String::from("20231115051320 +0600"),
                title: String::from("Show A"),
                description: String::from("Show A desc"),
            }]
        );
    }

    #[test]
    fn test_merge_dedups_channels_across_feeds() {
        // Arrange
        let directory = ChannelDirectory::default();
        let fetches = vec![
            ok(
                "u1",
                vec![feed("c2", "Day One Name", vec![program("100", "200", "A")])],
            ),
            ok(
                "u2",
                vec![feed("c2", "Day Two Name", vec![program("300", "400", "B")])],
            ),
        ];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert: one channel, programmes from both days
        assert_eq!(doc.channels.len(), 1);
        assert_eq!(doc.channels[0].display_name, "Day One Name");
        let titles: Vec<&str> = doc.programmes.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_merge_metadata_overrides_later_feed_name() {
        // Arrange: c1 first appears in the second feed
        let directory = directory_with_c1();
        let fetches = vec![
            ok("u1", vec![feed("c9", "Other", vec![])]),
            ok("u2", vec![feed("c1", "Late Name", vec![])]),
        ];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert
        assert_eq!(doc.channels[1].id, "c1");
        assert_eq!(doc.channels[1].display_name, "Channel One");
    }

    #[test]
    fn test_merge_sorts_programs_by_numeric_start() {
        // Arrange: lexical order would put "1000" before "200"
        let directory = ChannelDirectory::default();
        let fetches = vec![ok(
            "u1",
            vec![feed(
                "c1",
                "C1",
                vec![
                    program("300", "350", "third"),
                    program("1000", "1100", "fourth"),
                    program("100", "150", "first"),
                    program("200", "250", "second"),
                ],
            )],
        )];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert
        let titles: Vec<&str> = doc.programmes.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn test_merge_sort_is_stable_for_equal_starts() {
        // Arrange
        let directory = ChannelDirectory::default();
        let fetches = vec![ok(
            "u1",
            vec![feed(
                "c1",
                "C1",
                vec![
                    program("500", "600", "late"),
                    program("100", "200", "tie-a"),
                    program("100", "300", "tie-b"),
                ],
            )],
        )];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert
        let titles: Vec<&str> = doc.programmes.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["tie-a", "tie-b", "late"]);
    }

    #[test]
    fn test_merge_drops_invalid_and_unformattable_programs() {
        // Arrange
        let directory = ChannelDirectory::default();
        let fetches = vec![ok(
            "u1",
            vec![feed(
                "c1",
                "C1",
                vec![
                    program("0", "100", "zero start"),
                    program("200", "150", "reversed"),
                    program("abc", "100", "garbage"),
                    program("1700000000", "300000000000", "far future"),
                    program("1700000000", "1700003600", "kept"),
                    RawProgram::default(),
                ],
            )],
        )];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert
        assert_eq!(doc.programmes.len(), 1);
        assert_eq!(doc.programmes[0].title, "kept");
    }

    #[test]
    fn test_merge_missing_title_and_description_are_empty() {
        // Arrange
        let directory = ChannelDirectory::default();
        let raw = RawProgram {
            start: Some(String::from("100")),
            end: Some(String::from("200")),
            title: None,
            description: None,
        };
        let fetches = vec![ok("u1", vec![feed("c1", "C1", vec![raw])])];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert
        assert_eq!(doc.programmes[0].title, "");
        assert_eq!(doc.programmes[0].description, "");
    }

    #[test]
    fn test_merge_unknown_channels_collapse() {
        // Arrange
        let directory = ChannelDirectory::default();
        let anonymous = || RawChannelFeed {
            channel_id: None,
            channel_name: None,
            programs: vec![program("100", "200", "orphan")],
        };
        let fetches = vec![ok("u1", vec![anonymous()]), ok("u2", vec![anonymous()])];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert
        assert_eq!(doc.channels.len(), 1);
        assert_eq!(doc.channels[0].id, UNKNOWN_CHANNEL_ID);
        assert_eq!(doc.channels[0].display_name, UNKNOWN_CHANNEL_NAME);
        assert_eq!(doc.programmes.len(), 2);
        assert!(
            doc.programmes
                .iter()
                .all(|p| p.channel_id == UNKNOWN_CHANNEL_ID)
        );
    }

    #[test]
    fn test_merge_skips_failed_feed() {
        // Arrange
        let directory = ChannelDirectory::default();
        let fetches = vec![
            ok(
                "u1",
                vec![feed("c1", "C1", vec![program("100", "200", "day1")])],
            ),
            failed("u2"),
            ok(
                "u3",
                vec![feed("c3", "C3", vec![program("300", "400", "day3")])],
            ),
        ];

        // Act
        let doc = merge_feeds(&directory, fetches);

        // Assert
        let ids: Vec<&str> = doc.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c3"]);
        let titles: Vec<&str> = doc.programmes.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["day1", "day3"]);
    }

    #[test]
    fn test_merge_logs_failed_feed_as_warning() {
        // Arrange
        let directory = ChannelDirectory::default();
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().at_level(tracing::Level::WARN))
            .run_with_handle();

        // Act
        let doc = with_default(subscriber, || merge_feeds(&directory, vec![failed("u2")]));

        // Assert
        handle.assert_finished();
        assert_eq!(doc, EpgDocument::default());
    }

    /// Mock API serving canned feeds per URL.
    struct MockAynaApi {
        feeds: Vec<(String, Result<Vec<RawChannelFeed>, String>)>,
    }

    impl AynaApi for MockAynaApi {
        async fn fetch_channel_directory(&self) -> Result<ChannelDirectory> {
            Ok(ChannelDirectory::default())
        }

        async fn fetch_feed(&self, url: &str) -> Result<Vec<RawChannelFeed>> {
            let (_, outcome) = self
                .feeds
                .iter()
                .find(|(u, _)| u == url)
                .ok_or_else(|| anyhow!("unexpected URL: {url}"))?;
            outcome.clone().map_err(|e| anyhow!(e))
        }
    }

    #[tokio::test]
    async fn test_collect_epg_keeps_url_order() {
        // Arrange
        let api = MockAynaApi {
            feeds: vec![
                (
                    String::from("u1"),
                    Ok(vec![feed("c1", "Day1", vec![program("100", "200", "a")])]),
                ),
                (String::from("u2"), Err(String::from("timeout"))),
                (
                    String::from("u3"),
                    Ok(vec![
                        feed("c1", "Day3", vec![program("500", "600", "c")]),
                        feed("c2", "Two", vec![program("300", "400", "b")]),
                    ]),
                ),
            ],
        };
        let urls = vec![String::from("u1"), String::from("u2"), String::from("u3")];

        // Act
        let doc = collect_epg(&api, &urls, &ChannelDirectory::default()).await;

        // Assert
        let ids: Vec<&str> = doc.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(doc.channels[0].display_name, "Day1");
        let titles: Vec<&str> = doc.programmes.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c", "b"]);
    }
}

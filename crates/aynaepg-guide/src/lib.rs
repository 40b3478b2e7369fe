//! EPG merge and XMLTV generation for aynaepg.
//!
//! Turns the upstream channel directory and per-day feeds into a single
//! XMLTV document.

/// Merging of feeds into channel and programme records.
pub mod merge;
/// End-to-end document build against an upstream API.
pub mod pipeline;
/// Epoch to XMLTV timestamp conversion.
pub mod time;
/// Raw program time validation.
pub mod validate;
/// XMLTV serialization.
pub mod xmltv;

pub use merge::{
    ChannelRegistry, EpgDocument, FeedFetch, MergedChannel, MergedProgramme, collect_epg,
    merge_feeds,
};
pub use pipeline::{build_epg_document, build_epg_xml};
pub use time::format_epoch;
pub use validate::{ProgramWindow, validate_program};
pub use xmltv::write_document;

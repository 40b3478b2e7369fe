//! In-memory result cache for aynaepg.
//!
//! Holds the most recently built guide document under a single fixed key
//! until its TTL runs out.

mod slot;

#[allow(clippy::module_name_repetitions)]
pub use slot::{CACHE_KEY, CacheEntry, DEFAULT_TTL, ResultCache};

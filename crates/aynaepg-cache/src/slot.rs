//! Single-slot TTL cache.

use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Key of the single cache slot.
pub const CACHE_KEY: &str = "epg";

/// Default time-to-live (one hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cached value with its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Slot key, always [`CACHE_KEY`].
    pub key: &'static str,
    /// Cached value.
    pub value: T,
    /// Instant after which the entry is stale.
    pub expires_at: Instant,
}

impl<T> CacheEntry<T> {
    /// Whether the entry is still fresh at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-wide cache with one slot.
///
/// Reads and writes are atomic with respect to the slot. Concurrent misses
/// are not coalesced: each caller rebuilds and the last `set` wins.
#[derive(Debug)]
pub struct ResultCache<T> {
    ttl: Duration,
    slot: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Clone> ResultCache<T> {
    /// Creates an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Returns the configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value if present and not expired.
    pub async fn get(&self) -> Option<T> {
        let now = Instant::now();
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some(entry) if entry.is_fresh(now) => Some(entry.value.clone()),
            Some(_) => {
                tracing::debug!(key = CACHE_KEY, "Cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Stores `value`, replacing any previous entry and resetting the expiry
    /// to now + TTL.
    ///
    /// A TTL too large to add to the current instant stores an entry that is
    /// already stale.
    pub async fn set(&self, value: T) {
        let now = Instant::now();
        let expires_at = now.checked_add(self.ttl).unwrap_or(now);
        *self.slot.write().await = Some(CacheEntry {
            key: CACHE_KEY,
            value,
            expires_at,
        });
        tracing::debug!(
            key = CACHE_KEY,
            ttl_secs = self.ttl.as_secs(),
            "Cache entry stored"
        );
    }

    /// Remaining lifetime of the current entry, or `None` if the slot is
    /// empty or stale.
    pub async fn expires_in(&self) -> Option<Duration> {
        let now = Instant::now();
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.expires_at.saturating_duration_since(now))
    }
}

impl<T: Clone> Default for ResultCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

//! TTL cache for "does this site bind a host to language L" lookups.
//!
//! The lookup is a linear scan over a site's host bindings and is repeated for
//! every page variant in a run. The cache is advisory: dropping it, or letting
//! every entry expire, changes performance only, never output.
//!
//! A [`HostBindingCache`] can be scoped to a single run (the default in
//! [`SitemapBuilder`](crate::SitemapBuilder)) or injected and shared between
//! runs, in which case entries older than the TTL are evicted on access and by
//! [`HostBindingCache::purge_expired`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default time-to-live for cached lookups.
pub const DEFAULT_HOST_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct TtlEntry {
    value: bool,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl TtlEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Hit/miss counters for observability.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to be computed.
    pub misses: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<(String, String), TtlEntry>,
    stats: CacheStats,
}

/// Thread-safe memo of host-binding lookups keyed by `(site_url, language)`.
#[derive(Debug)]
pub struct HostBindingCache {
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl Default for HostBindingCache {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_CACHE_TTL)
    }
}

impl HostBindingCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `(site_url, language)` or compute and store it.
    ///
    /// Language keys are case-insensitive.
    pub fn get_or_insert_with(
        &self,
        site_url: &str,
        language: &str,
        compute: impl FnOnce() -> bool,
    ) -> bool {
        let key = (site_url.to_string(), language.to_ascii_lowercase());
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = inner.entries.get(&key).copied() {
            if entry.is_live(now) {
                inner.stats.hits += 1;
                return entry.value;
            }
            inner.entries.remove(&key);
        }

        inner.stats.misses += 1;
        let value = compute();
        inner.entries.insert(
            key,
            TtlEntry {
                value,
                expires_at: now.checked_add(self.ttl),
            },
        );
        value
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.is_live(now));
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(removed, "Purged expired host binding lookups");
        }
        removed
    }

    /// Forget every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.clear();
    }

    /// Number of live and expired entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
    }
}

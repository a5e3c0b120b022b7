//! Statistics for the overlay cache.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;

/// Counters for the overlay cache.
///
/// All fields are atomic for lock-free reads from metrics endpoints.
#[derive(Debug, Default)]
pub struct OverlayCacheStats {
    /// Fresh hits
    pub hits: AtomicU64,
    /// Hits served past the stale threshold
    pub stale_hits: AtomicU64,
    /// Lookups that found nothing usable
    pub misses: AtomicU64,
    /// Entries dropped for passing their hard expiry
    pub expired: AtomicU64,
    /// Entries dropped for failing the shape check
    pub malformed: AtomicU64,
    /// Background refreshes started
    pub refreshes: AtomicU64,
    /// Requests that attached to an in-flight fetch
    pub deduplicated: AtomicU64,
    /// Network fetches started
    pub fetches: AtomicU64,
    /// Network fetches that failed
    pub fetch_errors: AtomicU64,
    /// Responses discarded because a newer overlapping request was issued
    pub superseded: AtomicU64,
    /// Entries evicted by LRU capacity
    pub evictions: AtomicU64,
}

impl OverlayCacheStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("overlay_cache_hits_total").increment(1);
    }

    pub(crate) fn record_stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
        counter!("overlay_cache_stale_total").increment(1);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("overlay_cache_misses_total").increment(1);
    }

    pub(crate) fn record_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
        counter!("overlay_cache_superseded_total").increment(1);
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Plain-value copy of the counters.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.hits,
            &self.stale_hits,
            &self.misses,
            &self.expired,
            &self.malformed,
            &self.refreshes,
            &self.deduplicated,
            &self.fetches,
            &self.fetch_errors,
            &self.superseded,
            &self.evictions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub malformed: u64,
    pub refreshes: u64,
    pub deduplicated: u64,
    pub fetches: u64,
    pub fetch_errors: u64,
    pub superseded: u64,
    pub evictions: u64,
}

impl CacheStatsSnapshot {
    /// Hit rate as a percentage (0-100); stale hits count as hits.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits + self.stale_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

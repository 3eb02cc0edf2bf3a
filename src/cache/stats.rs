//! Cache Statistics Module
//!
//! Tracks cache-aside activity: hits, misses, writes and invalidations.

use serde::Serialize;

// == Cache Stats ==
/// Counters maintained by [`crate::cache::CacheStore`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing, an expired entry, or a failing backend
    pub misses: u64,
    /// Successful writes
    pub sets: u64,
    /// Successful single-key deletes
    pub deletes: u64,
    /// Entries removed by pattern invalidation
    pub invalidated: u64,
    /// Expired entries removed by the maintenance sweep
    pub expired_purged: u64,
    /// Backend operations that failed and were absorbed
    pub errors: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_invalidated(&mut self, count: usize) {
        self.invalidated += count as u64;
    }

    pub fn record_purged(&mut self, count: usize) {
        self.expired_purged += count as u64;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.invalidated, 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = CacheStats::new();
        for _ in 0..3 {
            stats.record_hit();
        }
        stats.record_miss();

        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bulk_counters() {
        let mut stats = CacheStats::new();
        stats.record_invalidated(4);
        stats.record_invalidated(0);
        stats.record_purged(2);

        assert_eq!(stats.invalidated, 4);
        assert_eq!(stats.expired_purged, 2);
    }
}

//! Cache statistics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time cache statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entries currently stored (expired entries count until evicted)
    pub size: usize,
    /// Total number of cache hits
    pub hits: u64,
    /// Total number of cache misses, including reads of expired entries
    pub misses: u64,
    /// Entries dropped to respect the size limit
    pub evictions: u64,
    /// `hits / (hits + misses)`, or 0.0 before the first lookup
    pub hit_rate: f64,
}

impl CacheStats {
    /// Total number of lookups served
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Thread-safe counters behind [`CacheStats`]
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheMetrics {
    /// Create zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an eviction
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    /// Take a snapshot for a cache currently holding `size` entries
    pub fn snapshot(&self, size: usize) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        CacheStats {
            size,
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_without_lookups() {
        let metrics = CacheMetrics::new();
        let stats = metrics.snapshot(0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.lookups(), 0);
    }

    #[test]
    fn test_hit_rate_calculation() {
        let metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();

        let stats = metrics.snapshot(3);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.75);
        assert_eq!(stats.size, 3);
    }

    #[test]
    fn test_reset() {
        let metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.record_eviction();
        metrics.reset();

        let stats = metrics.snapshot(0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.evictions, 0);
    }
}

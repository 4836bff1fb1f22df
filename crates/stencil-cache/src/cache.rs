//! TTL cache implementation

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;
use crate::metrics::{CacheMetrics, CacheStats};

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false the cache stores nothing and every lookup misses
    pub enabled: bool,
    /// Default time-to-live in seconds
    pub ttl: u64,
    /// Maximum number of entries, 0 for unbounded
    #[serde(alias = "maxSize")]
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 3600, // 1 hour
            max_size: 1000,
        }
    }
}

impl CacheConfig {
    /// Default TTL as a duration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

/// Key/value cache with per-entry expiry
///
/// Expired entries are removed lazily: a `get` that finds one drops it and
/// counts a miss. All operations take `&self`; share the cache through an
/// `Arc` when several owners need it.
#[derive(Debug)]
pub struct TemplateCache<V> {
    config: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    metrics: CacheMetrics,
}

impl<V: Clone> TemplateCache<V> {
    /// Create a cache with the default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
            metrics: CacheMetrics::new(),
        }
    }

    /// Get cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether the cache stores anything at all
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Retrieve a value, dropping it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.config.enabled {
            self.metrics.record_miss();
            return None;
        }

        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.metrics.record_hit();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
            tracing::trace!(key, "cache entry expired");
        }
        self.metrics.record_miss();
        None
    }

    /// Store a value with an explicit TTL
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if !self.config.enabled {
            return;
        }

        let key = key.into();
        let mut entries = self.entries.lock();

        if self.config.max_size > 0
            && !entries.contains_key(&key)
            && entries.len() >= self.config.max_size
        {
            self.make_room(&mut entries);
        }

        entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Store a value with the configured default TTL
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.config.default_ttl());
    }

    /// Remove a key, returning whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Remove every entry; statistics are kept
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Check whether a live entry exists, without touching statistics
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        Self::purge_locked(&mut entries, Instant::now())
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.len())
    }

    /// Reset hit/miss/eviction counters
    pub fn reset_stats(&self) {
        self.metrics.reset();
    }

    fn purge_locked(entries: &mut HashMap<String, CacheEntry<V>>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    /// Free one slot: expired entries go first, then the entry closest to expiry
    fn make_room(&self, entries: &mut HashMap<String, CacheEntry<V>>) {
        if Self::purge_locked(entries, Instant::now()) > 0 {
            return;
        }

        let victim = entries
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at.is_none(), entry.expires_at, entry.created_at))
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            entries.remove(&key);
            self.metrics.record_eviction();
            tracing::debug!(key = %key, "evicted cache entry to respect max_size");
        }
    }
}

impl<V: Clone> Default for TemplateCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

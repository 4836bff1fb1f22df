//! Cache entries with expiry tracking

use std::time::{Duration, Instant};

/// A cached value together with its lifetime bounds
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,
    /// When the entry was stored
    pub created_at: Instant,
    /// When the entry stops being served; `None` when the TTL overflows the clock
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    /// Create a new entry that expires `ttl` from now
    pub fn new(value: V, ttl: Duration) -> Self {
        let created_at = Instant::now();
        Self {
            value,
            created_at,
            expires_at: created_at.checked_add(ttl),
        }
    }

    /// Check if the entry has expired as of `now`
    ///
    /// An entry is expired once `now >= expires_at`, so a zero TTL is never served.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.map(|expires| now >= expires).unwrap_or(false)
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Get remaining TTL, `None` once expired or when the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at?.checked_duration_since(Instant::now())
    }
}

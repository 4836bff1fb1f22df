//! # Stencil Cache
//!
//! In-memory key/value cache used by the Stencil template catalog.
//!
//! ## Features
//!
//! - **Per-entry TTL**: every entry carries its own expiry, checked lazily on read
//! - **Bounded size**: optional capacity with expiry-aware eviction
//! - **Statistics**: hit/miss/eviction counters and hit rate
//! - **Shareable**: all operations take `&self`, so a cache can live behind an `Arc`
//!
//! Nothing is persisted; a cache lives as long as its owner.

pub mod cache;
pub mod entry;
pub mod metrics;

pub use cache::{CacheConfig, TemplateCache};
pub use entry::CacheEntry;
pub use metrics::{CacheMetrics, CacheStats};

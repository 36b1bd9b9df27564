//! Cache Statistics Module
//!
//! Tracks hit/miss counters and reports the state of the active cache tier.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Below this hit ratio the cache is reported as degraded.
pub const DEGRADED_HIT_RATIO: f64 = 0.3;

/// Lookups required before the hit ratio is judged.
pub const MIN_LOOKUPS_FOR_HEALTH: u64 = 100;

// == Cache Type ==
/// Which tier produced a stats snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    Networked,
    Local,
    NotInitialized,
}

impl CacheType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Networked => "networked",
            CacheType::Local => "local",
            CacheType::NotInitialized => "not_initialized",
        }
    }
}

// == Cache Health ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

// == Cache Stats ==
/// Point-in-time statistics for one cache tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, expired or undecodable)
    pub misses: u64,
    /// hits / (hits + misses), or 0.0 before any lookup
    pub hit_ratio: f64,
    /// Approximate number of stored keys
    pub key_count: usize,
    pub cache_type: CacheType,
    /// Time of the last eager sweep, local tier only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cleanup: Option<DateTime<Utc>>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a snapshot, deriving the hit ratio from the counters.
    pub fn new(cache_type: CacheType, hits: u64, misses: u64, key_count: usize) -> Self {
        Self {
            hits,
            misses,
            hit_ratio: hit_ratio(hits, misses),
            key_count,
            cache_type,
            last_cleanup: None,
        }
    }

    /// Snapshot reported when no cache manager exists.
    pub fn not_initialized() -> Self {
        Self::new(CacheType::NotInitialized, 0, 0, 0)
    }

    pub fn with_last_cleanup(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_cleanup = at;
        self
    }

    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }

    // == Health ==
    /// Unhealthy without a manager; degraded on a low hit ratio once enough
    /// lookups have been seen.
    pub fn health(&self) -> CacheHealth {
        if self.cache_type == CacheType::NotInitialized {
            CacheHealth::Unhealthy
        } else if self.total_lookups() >= MIN_LOOKUPS_FOR_HEALTH
            && self.hit_ratio < DEGRADED_HIT_RATIO
        {
            CacheHealth::Degraded
        } else {
            CacheHealth::Healthy
        }
    }
}

fn hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Hit Counters ==
/// Lock-free hit/miss counters shared across concurrent requests.
///
/// Counts are a monitoring signal; `snapshot` may observe hits and misses
/// from slightly different instants.
#[derive(Debug, Default)]
pub struct HitCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns `(hits, misses)`.
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

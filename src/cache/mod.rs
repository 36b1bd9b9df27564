//! Cache Module
//!
//! Response cache tiers (Redis and in-memory), their failover composition,
//! key derivation and invalidation entry points.

mod entry;
mod invalidation;
mod key;
mod local;
mod manager;
mod redis_store;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheItem};
pub use key::{derive_key, resource_tag, short_key, Resource, SHORT_KEY_LEN};
pub use local::LocalStore;
pub use manager::CacheManager;
pub use redis_store::RedisStore;
pub use stats::{CacheHealth, CacheStats, CacheType, HitCounters};
pub use store::CacheStore;

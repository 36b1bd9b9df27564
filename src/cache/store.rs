//! Cache Store Module
//!
//! The capability set shared by every cache tier.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheItem, CacheStats};
use crate::error::Result;

// == Cache Store ==
/// A cache tier holding captured responses under string keys.
///
/// `get` is fail-open: any failure to read is reported as a miss. Mutating
/// operations surface their failures.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the live item for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Option<CacheItem>;

    /// Stores an item, replacing any previous one, expiring after `ttl`.
    async fn set(
        &self,
        key: &str,
        data: Vec<u8>,
        headers: HashMap<String, String>,
        ttl: Duration,
    ) -> Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every key owned by this store.
    async fn clear(&self) -> Result<()>;

    /// Removes every key containing `pattern` as a substring.
    async fn invalidate_pattern(&self, pattern: &str) -> Result<()>;

    async fn stats(&self) -> CacheStats;

    async fn reset_stats(&self) -> Result<()>;
}

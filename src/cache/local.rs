//! Local Store Module
//!
//! In-process cache tier. Data is lost on restart. Expiry is checked lazily
//! on read and eagerly by the sweep in [`crate::tasks::spawn_cleanup_task`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::cache::{CacheItem, CacheStats, CacheStore, CacheType};
use crate::error::Result;

// == Local Store ==
/// HashMap-backed store guarded by a single reader/writer lock.
///
/// There is no capacity bound; entries leave only through TTL expiry,
/// deletion, invalidation or clear. Hits and misses are not counted.
#[derive(Debug, Default)]
pub struct LocalStore {
    entries: RwLock<HashMap<String, CacheItem>>,
    last_cleanup: RwLock<Option<DateTime<Utc>>>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and records the sweep time.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|_, item| !item.is_expired());
            before - entries.len()
        };

        *self.last_cleanup.write().await = Some(Utc::now());
        removed
    }

    /// Number of physically present entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for LocalStore {
    async fn get(&self, key: &str) -> Option<CacheItem> {
        let entries = self.entries.read().await;
        entries.get(key).filter(|item| !item.is_expired()).cloned()
    }

    async fn set(
        &self,
        key: &str,
        data: Vec<u8>,
        headers: HashMap<String, String>,
        ttl: Duration,
    ) -> Result<()> {
        let item = CacheItem::new(data, headers, ttl);
        self.entries.write().await.insert(key.to_string(), item);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .retain(|key, _| !key.contains(pattern));
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let key_count = self.entries.read().await.len();
        let last_cleanup = *self.last_cleanup.read().await;
        CacheStats::new(CacheType::Local, 0, 0, key_count).with_last_cleanup(last_cleanup)
    }

    async fn reset_stats(&self) -> Result<()> {
        Ok(())
    }
}

//! Cache Manager Module
//!
//! Composes a primary and a fallback tier. The Redis-or-local decision is
//! made once in [`CacheManager::initialize`] and never revisited.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cache::{CacheItem, CacheStats, CacheStore, LocalStore, RedisStore};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::spawn_cleanup_task;

// == Cache Manager ==
pub struct CacheManager {
    primary: Arc<dyn CacheStore>,
    fallback: Arc<dyn CacheStore>,
    /// True when Redis was unavailable at startup and the local store is primary
    use_fallback: bool,
    sweep: Option<JoinHandle<()>>,
}

impl CacheManager {
    // == Constructors ==
    /// Builds the manager from configuration.
    ///
    /// Starts the local store's sweep, then tries Redis. A Redis failure is
    /// logged once and the local store becomes primary for the process
    /// lifetime.
    pub async fn initialize(config: &CacheConfig) -> Self {
        let local = Arc::new(LocalStore::new());
        let sweep = spawn_cleanup_task(local.clone(), config.cleanup_interval());

        let mut manager = match RedisStore::connect(&config.redis).await {
            Ok(redis) => {
                info!("Using Redis cache as primary with in-memory fallback");
                Self::with_stores(Arc::new(redis), local, false)
            }
            Err(e) => {
                warn!(error = %e, "Redis cache initialization failed, using in-memory cache");
                let primary: Arc<dyn CacheStore> = local.clone();
                Self::with_stores(primary, local, true)
            }
        };
        manager.sweep = Some(sweep);
        manager
    }

    /// Composes explicit stores. No sweep task is owned.
    pub fn with_stores(
        primary: Arc<dyn CacheStore>,
        fallback: Arc<dyn CacheStore>,
        use_fallback: bool,
    ) -> Self {
        Self {
            primary,
            fallback,
            use_fallback,
            sweep: None,
        }
    }

    pub fn uses_fallback(&self) -> bool {
        self.use_fallback
    }

    /// The fallback tier needs its own call only in fallback mode, and only
    /// when it is a different instance from the primary.
    fn fallback_is_distinct(&self) -> bool {
        self.use_fallback && !Arc::ptr_eq(&self.primary, &self.fallback)
    }

    // == Get ==
    /// A primary miss is final unless running in fallback mode.
    pub async fn get(&self, key: &str) -> Option<CacheItem> {
        if let Some(item) = self.primary.get(key).await {
            return Some(item);
        }

        if self.fallback_is_distinct() {
            return self.fallback.get(key).await;
        }
        None
    }

    // == Set ==
    /// Writes to the primary; on failure retries once on the fallback.
    ///
    /// A failed fallback write is logged and swallowed.
    pub async fn set(
        &self,
        key: &str,
        data: Vec<u8>,
        headers: HashMap<String, String>,
        ttl: Duration,
    ) -> Result<()> {
        let Err(e) = self
            .primary
            .set(key, data.clone(), headers.clone(), ttl)
            .await
        else {
            return Ok(());
        };

        if self.use_fallback {
            return Err(e);
        }

        warn!(key = %key, error = %e, "Primary cache set failed, using fallback");
        if let Err(fallback_err) = self.fallback.set(key, data, headers, ttl).await {
            error!(key = %key, error = %fallback_err, "Fallback cache set failed");
        }
        Ok(())
    }

    // == Delete / Clear / Invalidate ==
    pub async fn delete(&self, key: &str) -> Result<()> {
        let primary = self.primary.delete(key).await;
        if self.fallback_is_distinct() {
            let fallback = self.fallback.delete(key).await;
            return primary.and(fallback);
        }
        primary
    }

    pub async fn clear(&self) -> Result<()> {
        let primary = self.primary.clear().await;
        if self.fallback_is_distinct() {
            let fallback = self.fallback.clear().await;
            return primary.and(fallback);
        }
        primary
    }

    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<()> {
        let primary = self.primary.invalidate_pattern(pattern).await;
        if self.fallback_is_distinct() {
            let fallback = self.fallback.invalidate_pattern(pattern).await;
            return primary.and(fallback);
        }
        primary
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        self.primary.stats().await
    }

    pub async fn reset_stats(&self) -> Result<()> {
        self.primary.reset_stats().await
    }

    // == Shutdown ==
    /// Stops the local sweep task, if this manager owns one.
    pub fn shutdown(&self) {
        if let Some(sweep) = &self.sweep {
            sweep.abort();
        }
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheType;
    use crate::config::RedisConfig;
    use crate::error::CacheError;
    use async_trait::async_trait;

    /// A tier whose writes always fail.
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Option<CacheItem> {
            None
        }

        async fn set(
            &self,
            _key: &str,
            _data: Vec<u8>,
            _headers: HashMap<String, String>,
            _ttl: Duration,
        ) -> Result<()> {
            Err(CacheError::Timeout("SET"))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(CacheError::Timeout("DEL"))
        }

        async fn clear(&self) -> Result<()> {
            Err(CacheError::Timeout("SCAN"))
        }

        async fn invalidate_pattern(&self, _pattern: &str) -> Result<()> {
            Err(CacheError::Timeout("SCAN"))
        }

        async fn stats(&self) -> CacheStats {
            CacheStats::new(CacheType::Networked, 0, 0, 0)
        }

        async fn reset_stats(&self) -> Result<()> {
            Ok(())
        }
    }

    const TTL: Duration = Duration::from_secs(60);

    fn unreachable_config() -> CacheConfig {
        CacheConfig {
            redis: RedisConfig {
                host: "127.0.0.1".to_string(),
                port: 1,
                connect_timeout_ms: 500,
                ..RedisConfig::default()
            },
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_falls_back_to_local() {
        let manager = CacheManager::initialize(&unreachable_config()).await;

        assert!(manager.uses_fallback());
        assert_eq!(manager.stats().await.cache_type, CacheType::Local);

        manager
            .set("posts:abc", b"body".to_vec(), HashMap::new(), TTL)
            .await
            .unwrap();
        assert_eq!(manager.get("posts:abc").await.unwrap().data, b"body");

        manager.invalidate_pattern("posts").await.unwrap();
        assert!(manager.get("posts:abc").await.is_none());

        manager.delete("missing").await.unwrap();
        manager.clear().await.unwrap();
        manager.reset_stats().await.unwrap();
        manager.shutdown();
    }

    #[tokio::test]
    async fn test_primary_miss_does_not_consult_fallback() {
        let primary = Arc::new(LocalStore::new());
        let fallback = Arc::new(LocalStore::new());
        fallback
            .set("k", b"stale".to_vec(), HashMap::new(), TTL)
            .await
            .unwrap();

        let manager = CacheManager::with_stores(primary, fallback, false);
        assert!(manager.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_primary_write_goes_to_fallback() {
        let fallback = Arc::new(LocalStore::new());
        let manager = CacheManager::with_stores(Arc::new(BrokenStore), fallback.clone(), false);

        manager
            .set("k", b"v".to_vec(), HashMap::new(), TTL)
            .await
            .unwrap();

        assert_eq!(fallback.get("k").await.unwrap().data, b"v");
    }

    #[tokio::test]
    async fn test_failed_fallback_write_is_swallowed() {
        let manager =
            CacheManager::with_stores(Arc::new(BrokenStore), Arc::new(BrokenStore), false);

        assert!(manager
            .set("k", b"v".to_vec(), HashMap::new(), TTL)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_invalidation_errors_propagate() {
        let manager =
            CacheManager::with_stores(Arc::new(BrokenStore), Arc::new(LocalStore::new()), false);

        assert!(manager.invalidate_pattern("posts").await.is_err());
        assert!(manager.clear().await.is_err());
        assert!(manager.delete("k").await.is_err());
    }

    #[tokio::test]
    async fn test_healthy_mode_leaves_fallback_untouched() {
        let primary = Arc::new(LocalStore::new());
        let fallback = Arc::new(LocalStore::new());
        fallback
            .set("posts:1", b"v".to_vec(), HashMap::new(), TTL)
            .await
            .unwrap();

        let manager = CacheManager::with_stores(primary, fallback.clone(), false);
        manager.invalidate_pattern("posts").await.unwrap();

        assert!(fallback.get("posts:1").await.is_some());
    }

    #[tokio::test]
    async fn test_fallback_mode_with_distinct_stores_applies_to_both() {
        let primary = Arc::new(LocalStore::new());
        let fallback = Arc::new(LocalStore::new());
        fallback
            .set("k", b"from-fallback".to_vec(), HashMap::new(), TTL)
            .await
            .unwrap();

        let manager = CacheManager::with_stores(primary.clone(), fallback.clone(), true);
        assert_eq!(manager.get("k").await.unwrap().data, b"from-fallback");

        manager.clear().await.unwrap();
        assert!(fallback.is_empty().await);
        assert!(primary.is_empty().await);
    }
}

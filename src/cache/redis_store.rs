//! Redis Store Module
//!
//! Networked cache tier shared by every server instance. All keys live under
//! a configured namespace prefix. `clear`, `invalidate_pattern` and `stats`
//! enumerate the namespace with SCAN and are O(namespace size).

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::{debug, info, warn};

use crate::cache::{CacheItem, CacheStats, CacheStore, CacheType, HitCounters};
use crate::config::RedisConfig;
use crate::error::{CacheError, Result};

/// COUNT hint per SCAN round trip.
const SCAN_BATCH: usize = 500;

/// Keys per DEL command during bulk removal.
const DEL_BATCH: usize = 500;

// == Redis Store ==
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
    response_timeout: Duration,
    counters: HitCounters,
}

impl RedisStore {
    // == Constructor ==
    /// Connects and verifies the server with PING.
    ///
    /// Any failure here is returned as [`CacheError::Connection`] so the
    /// manager can fall back to the local tier.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.db,
                password: config.password.clone(),
                ..Default::default()
            },
        };
        let client = Client::open(info).map_err(|e| CacheError::Connection(e.to_string()))?;

        let address = config.address();
        let mut conn = tokio::time::timeout(config.connect_timeout(), ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Connection(format!("timed out connecting to {}", address)))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let ping = redis::cmd("PING");
        let pong: String = tokio::time::timeout(config.connect_timeout(), ping.query_async(&mut conn))
            .await
            .map_err(|_| CacheError::Connection(format!("PING to {} timed out", address)))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        debug!(reply = %pong, "Redis PING");

        info!(address = %address, db = config.db, prefix = %config.key_prefix, "Connected to Redis");

        Ok(Self {
            conn,
            prefix: config.key_prefix.clone(),
            response_timeout: config.response_timeout(),
            counters: HitCounters::new(),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Bounds a Redis command by the configured response timeout.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.response_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Timeout(op)),
        }
    }

    /// Collects every key matching a glob pattern.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH);
            let (next, batch): (u64, Vec<String>) =
                self.bounded("SCAN", cmd.query_async(&mut conn)).await?;
            keys.extend(batch);

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }

    /// Deletes every key matching a glob pattern, returning how many matched.
    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        let keys = self.scan_keys(pattern).await?;
        let mut conn = self.conn.clone();

        for chunk in keys.chunks(DEL_BATCH) {
            let _: () = self.bounded("DEL", conn.del(chunk)).await?;
        }

        Ok(keys.len())
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Option<CacheItem> {
        let full_key = self.namespaced(key);
        let mut conn = self.conn.clone();

        let raw: Option<String> = match self.bounded("GET", conn.get(&full_key)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %full_key, error = %e, "Redis GET failed, treating as miss");
                self.counters.record_miss();
                return None;
            }
        };

        let Some(raw) = raw else {
            self.counters.record_miss();
            return None;
        };

        let item: CacheItem = match serde_json::from_str(&raw) {
            Ok(item) => item,
            Err(e) => {
                warn!(key = %full_key, error = %e, "Undecodable cache item, treating as miss");
                self.counters.record_miss();
                return None;
            }
        };

        if item.is_expired() {
            if let Err(e) = self.delete(key).await {
                warn!(key = %full_key, error = %e, "Failed to delete expired cache item");
            }
            self.counters.record_miss();
            return None;
        }

        self.counters.record_hit();
        Some(item)
    }

    async fn set(
        &self,
        key: &str,
        data: Vec<u8>,
        headers: HashMap<String, String>,
        ttl: Duration,
    ) -> Result<()> {
        let full_key = self.namespaced(key);
        let payload = serde_json::to_string(&CacheItem::new(data, headers, ttl))?;
        // PX rejects 0, round sub-millisecond TTLs up
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(&full_key).arg(payload).arg("PX").arg(ttl_ms);
        let mut conn = self.conn.clone();
        let _: () = self.bounded("SET", cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_key = self.namespaced(key);
        let mut conn = self.conn.clone();
        let _: () = self.bounded("DEL", conn.del(&full_key)).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let pattern = format!("{}*", escape_glob(&self.prefix));
        let removed = self.delete_matching(&pattern).await?;
        info!(count = removed, "Cleared cache items");
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<()> {
        let glob = format!("{}*{}*", escape_glob(&self.prefix), escape_glob(pattern));
        let removed = self.delete_matching(&glob).await?;
        info!(count = removed, pattern = %pattern, "Invalidated cache items");
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let pattern = format!("{}*", escape_glob(&self.prefix));
        let key_count = match self.scan_keys(&pattern).await {
            Ok(keys) => keys.len(),
            Err(e) => {
                warn!(error = %e, "Failed to count cache keys");
                0
            }
        };

        let (hits, misses) = self.counters.snapshot();
        CacheStats::new(CacheType::Networked, hits, misses, key_count)
    }

    async fn reset_stats(&self) -> Result<()> {
        self.counters.reset();
        Ok(())
    }
}

/// Escapes Redis glob metacharacters so `s` matches literally.
fn escape_glob(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

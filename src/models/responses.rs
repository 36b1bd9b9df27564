//! Response DTOs for the cache management API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheHealth, CacheStats, CacheType, Resource};
use crate::config::CacheConfig;

/// Response body for GET /admin/cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub status: String,
    pub stats: CacheStats,
    pub config: CacheSettingsView,
}

impl CacheStatsResponse {
    pub fn success(stats: CacheStats, config: CacheSettingsView) -> Self {
        Self {
            status: "success".to_string(),
            stats,
            config,
        }
    }
}

/// Effective cache settings as reported by the stats endpoint.
///
/// Redis details are only shown while the networked tier is active.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSettingsView {
    #[serde(rename = "type")]
    pub cache_type: CacheType,
    /// TTL rendered as e.g. `300s`
    pub ttl: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_db: Option<i64>,
    pub enabled: bool,
}

impl CacheSettingsView {
    pub fn new(config: &CacheConfig, cache_type: CacheType, enabled: bool) -> Self {
        let networked = cache_type == CacheType::Networked;
        Self {
            cache_type,
            ttl: format!("{}s", config.ttl_secs),
            redis_host: networked.then(|| config.redis.address()),
            redis_db: networked.then_some(config.redis.db),
            enabled,
        }
    }
}

/// Response body for clear, invalidate and reset operations
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            pattern: None,
            resource: None,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource.to_string());
        self
    }
}

/// Response body for GET /admin/cache/health
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealthResponse {
    pub status: CacheHealth,
    pub cache_type: CacheType,
    pub key_count: usize,
    pub hit_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl CacheHealthResponse {
    pub fn new(status: CacheHealth, stats: &CacheStats) -> Self {
        let issue = match status {
            CacheHealth::Healthy => None,
            CacheHealth::Degraded => Some("Low hit ratio".to_string()),
            CacheHealth::Unhealthy => Some("Cache not initialized".to_string()),
        };
        Self {
            status,
            cache_type: stats.cache_type,
            key_count: stats.key_count,
            hit_ratio: stats.hit_ratio,
            issue,
        }
    }
}

/// Response body for the liveness endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

//! API Handlers
//!
//! Management endpoints over the response cache: stats, clear, invalidation
//! and health.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::{CacheHealth, CacheManager, CacheStats, Resource};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    CacheHealthResponse, CacheSettingsView, CacheStatsResponse, HealthResponse, InvalidateQuery,
    MessageResponse,
};

/// Application state shared by the middleware and the management handlers.
///
/// `cache` is `None` when caching is disabled; the middleware then passes
/// requests through and the management surface reports `not_initialized`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Option<Arc<CacheManager>>,
    pub settings: Arc<CacheConfig>,
}

impl AppState {
    pub fn new(cache: Option<Arc<CacheManager>>, settings: CacheConfig) -> Self {
        Self {
            cache,
            settings: Arc::new(settings),
        }
    }

    /// Wraps an already built manager.
    pub fn with_manager(manager: CacheManager, settings: CacheConfig) -> Self {
        Self::new(Some(Arc::new(manager)), settings)
    }

    /// Builds the cache manager from configuration, unless caching is disabled.
    pub async fn from_config(config: &CacheConfig) -> Self {
        let cache = if config.enabled {
            Some(Arc::new(CacheManager::initialize(config).await))
        } else {
            info!("Response cache disabled by configuration");
            None
        };
        Self::new(cache, config.clone())
    }

    pub fn manager(&self) -> Result<&CacheManager> {
        self.cache.as_deref().ok_or(CacheError::NotInitialized)
    }

    /// TTL applied to captured responses.
    pub fn ttl(&self) -> Duration {
        self.settings.ttl()
    }

    pub async fn stats(&self) -> CacheStats {
        match &self.cache {
            Some(manager) => manager.stats().await,
            None => CacheStats::not_initialized(),
        }
    }
}

/// Handler for GET /admin/cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.stats().await;
    let settings = CacheSettingsView::new(&state.settings, stats.cache_type, state.cache.is_some());

    Json(CacheStatsResponse::success(stats, settings))
}

/// Handler for POST /admin/cache/stats/reset
pub async fn reset_stats_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.manager()?.reset_stats().await?;
    Ok(Json(MessageResponse::success("Cache statistics reset")))
}

/// Handler for DELETE /admin/cache
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.manager()?.clear_all().await?;
    Ok(Json(MessageResponse::success("Cache cleared successfully")))
}

/// Handler for POST /admin/cache/invalidate?pattern=...
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<MessageResponse>> {
    let pattern = query.pattern()?;
    state.manager()?.invalidate(pattern).await?;

    Ok(Json(
        MessageResponse::success("Cache invalidated successfully").with_pattern(pattern),
    ))
}

/// Handler for POST /admin/cache/invalidate/:resource
pub async fn invalidate_resource_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<MessageResponse>> {
    let resource: Resource = resource.parse()?;
    state.manager()?.invalidate_resource(resource).await?;

    Ok(Json(
        MessageResponse::success("Resource cache invalidated successfully")
            .with_resource(resource),
    ))
}

/// Handler for GET /admin/cache/health
///
/// 200 when healthy, 206 when the hit ratio is low, 503 without a cache.
pub async fn cache_health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<CacheHealthResponse>) {
    let stats = state.stats().await;
    let health = stats.health();
    let status = match health {
        CacheHealth::Healthy => StatusCode::OK,
        CacheHealth::Degraded => StatusCode::PARTIAL_CONTENT,
        CacheHealth::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(CacheHealthResponse::new(health, &stats)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

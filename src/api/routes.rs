//! API Routes
//!
//! Configures the Axum router: cached content routes plus the cache
//! management endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_health_handler, clear_handler, health_handler, invalidate_handler,
    invalidate_resource_handler, reset_stats_handler, stats_handler, AppState,
};
use crate::middleware::with_response_cache;

/// Creates the main router.
///
/// `content` holds the read endpoints to cache; only those routes get the
/// response cache layer.
///
/// # Endpoints
/// - `GET /admin/cache/stats` - Cache statistics and settings
/// - `POST /admin/cache/stats/reset` - Reset hit/miss counters
/// - `DELETE /admin/cache` - Clear every cached response
/// - `POST /admin/cache/invalidate?pattern=` - Invalidate by key substring
/// - `POST /admin/cache/invalidate/:resource` - Invalidate `media`, `posts` or `pages`
/// - `GET /admin/cache/health` - Cache health (200 / 206 / 503)
/// - `GET /health` - Liveness
pub fn create_router(state: AppState, content: Router) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let management = Router::new()
        .route("/admin/cache", delete(clear_handler))
        .route("/admin/cache/stats", get(stats_handler))
        .route("/admin/cache/stats/reset", post(reset_stats_handler))
        .route("/admin/cache/invalidate", post(invalidate_handler))
        .route(
            "/admin/cache/invalidate/:resource",
            post(invalidate_resource_handler),
        )
        .route("/admin/cache/health", get(cache_health_handler))
        .route("/health", get(health_handler))
        .with_state(state.clone());

    management
        .merge(with_response_cache(content, state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

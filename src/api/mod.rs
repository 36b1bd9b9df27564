//! API Module
//!
//! Cache management endpoints and the top-level router.
//!
//! # Endpoints
//! - `GET /admin/cache/stats` - Cache statistics
//! - `POST /admin/cache/stats/reset` - Reset counters
//! - `DELETE /admin/cache` - Clear the cache
//! - `POST /admin/cache/invalidate` - Invalidate by pattern
//! - `POST /admin/cache/invalidate/:resource` - Invalidate one resource family
//! - `GET /admin/cache/health` - Cache health
//! - `GET /health` - Liveness endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! Response Cache - read-through HTTP response caching
//!
//! Caches GET responses in Redis, falling back to an in-process store when
//! Redis is unreachable at startup.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheManager;
pub use config::Config;
pub use middleware::with_response_cache;
pub use tasks::spawn_cleanup_task;

//! HTTP middleware.

pub mod cache;

pub use cache::{response_cache_layer, with_response_cache, X_CACHE, X_CACHE_KEY};

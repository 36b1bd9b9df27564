//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache tiers and the management surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Networked store could not be reached at construction
    #[error("Failed to connect to Redis: {0}")]
    Connection(String),

    /// Steady-state Redis command failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A Redis command exceeded its bounded timeout
    #[error("Redis {0} timed out")]
    Timeout(&'static str),

    /// Cache item could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caching is disabled, no manager was built
    #[error("Cache manager not initialized")]
    NotInitialized,

    /// Invalid management request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::NotInitialized | CacheError::Connection(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Cache unavailable".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cache operation failed".to_string(),
            ),
        };

        let body = Json(json!({
            "status": "error",
            "message": message,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the response cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response = CacheError::InvalidRequest("Pattern parameter is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_initialized_maps_to_unavailable() {
        let response = CacheError::NotInitialized.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_timeout_maps_to_internal_error() {
        let response = CacheError::Timeout("DEL").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(CacheError::Timeout("DEL").to_string(), "Redis DEL timed out");
    }
}

//! Request DTOs for the cache management API
//!
//! Defines the structure of incoming query parameters.

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Query string for POST /admin/cache/invalidate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    /// Substring matched against cache keys
    #[serde(default)]
    pub pattern: Option<String>,
}

impl InvalidateQuery {
    /// Returns the pattern, rejecting a missing or empty one.
    pub fn pattern(&self) -> Result<&str> {
        match self.pattern.as_deref() {
            Some(pattern) if !pattern.is_empty() => Ok(pattern),
            _ => Err(CacheError::InvalidRequest(
                "Pattern parameter is required".to_string(),
            )),
        }
    }
}

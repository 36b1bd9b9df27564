//! Invalidation API
//!
//! Entry points for write paths. Call the matching wrapper after a mutation
//! commits; a failure here should be reported, not roll the write back.

use tracing::warn;

use crate::cache::{CacheManager, Resource};
use crate::error::Result;

impl CacheManager {
    /// Drops every cached response.
    pub async fn clear_all(&self) -> Result<()> {
        self.clear().await.inspect_err(|e| {
            warn!(error = %e, "Failed to clear cache");
        })
    }

    /// Drops every cached response whose key contains `pattern`.
    pub async fn invalidate(&self, pattern: &str) -> Result<()> {
        self.invalidate_pattern(pattern).await.inspect_err(|e| {
            warn!(pattern = %pattern, error = %e, "Failed to invalidate cache");
        })
    }

    pub async fn invalidate_resource(&self, resource: Resource) -> Result<()> {
        self.invalidate(resource.as_str()).await
    }

    pub async fn invalidate_posts(&self) -> Result<()> {
        self.invalidate_resource(Resource::Posts).await
    }

    pub async fn invalidate_pages(&self) -> Result<()> {
        self.invalidate_resource(Resource::Pages).await
    }

    pub async fn invalidate_media(&self) -> Result<()> {
        self.invalidate_resource(Resource::Media).await
    }
}

//! Cache Key Module
//!
//! Derives cache keys from `(method, url, user agent)` and tags them with the
//! resource they belong to so whole resources can be invalidated at once.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::CacheError;

/// Number of key characters echoed back in `X-Cache-Key`.
pub const SHORT_KEY_LEN: usize = 8;

// == Resource ==
/// Resource families whose cached responses are invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Posts,
    Pages,
    Media,
}

impl Resource {
    /// Tag check order for [`resource_tag`]; first match wins.
    pub const ALL: [Resource; 3] = [Resource::Posts, Resource::Pages, Resource::Media];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Posts => "posts",
            Resource::Pages => "pages",
            Resource::Media => "media",
        }
    }

    fn path_marker(&self) -> &'static str {
        match self {
            Resource::Posts => "/posts",
            Resource::Pages => "/pages",
            Resource::Media => "/media",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                CacheError::InvalidRequest(
                    "Invalid resource type. Use: media, posts, or pages".to_string(),
                )
            })
    }
}

// == Key Derivation ==
/// Returns the resource family a URL belongs to, if any.
pub fn resource_tag(url: &str) -> Option<Resource> {
    Resource::ALL
        .into_iter()
        .find(|r| url.contains(r.path_marker()))
}

/// Derives the cache key for a request.
///
/// The digest is SHA-256 over `method:url:user_agent`, hex encoded. Tagged
/// URLs produce `tag:digest`.
pub fn derive_key(method: &str, url: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b":");
    hasher.update(url.as_bytes());
    hasher.update(b":");
    hasher.update(user_agent.as_bytes());
    let digest = hex::encode(hasher.finalize());

    match resource_tag(url) {
        Some(tag) => format!("{}:{}", tag, digest),
        None => digest,
    }
}

/// First [`SHORT_KEY_LEN`] hex characters of the key's digest.
pub fn short_key(key: &str) -> &str {
    let digest = key.rsplit(':').next().unwrap_or(key);
    &digest[..digest.len().min(SHORT_KEY_LEN)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_is_deterministic() {
        let a = derive_key("GET", "/api/v1/posts?page=2", "curl/8.0");
        let b = derive_key("GET", "/api/v1/posts?page=2", "curl/8.0");
        assert_eq!(a, b);
    }

    #[test]
    fn test_user_agent_changes_key() {
        let a = derive_key("GET", "/api/v1/pages", "curl/8.0");
        let b = derive_key("GET", "/api/v1/pages", "Mozilla/5.0");
        assert_ne!(a, b);
    }

    #[test]
    fn test_query_string_changes_key() {
        let a = derive_key("GET", "/api/v1/media?limit=10", "ua");
        let b = derive_key("GET", "/api/v1/media?limit=20", "ua");
        assert_ne!(a, b);
    }

    #[test]
    fn test_tagged_key_shape() {
        let key = derive_key("GET", "/api/v1/posts/42", "ua");
        let (tag, digest) = key.split_once(':').unwrap();
        assert_eq!(tag, "posts");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_untagged_key_is_bare_digest() {
        let key = derive_key("GET", "/api/v1/settings", "ua");
        assert_eq!(key.len(), 64);
        assert!(!key.contains(':'));
    }

    #[test]
    fn test_resource_tag_first_match_wins() {
        assert_eq!(resource_tag("/posts/1/media"), Some(Resource::Posts));
        assert_eq!(resource_tag("/pages/about"), Some(Resource::Pages));
        assert_eq!(resource_tag("/media/logo.png"), Some(Resource::Media));
        assert_eq!(resource_tag("/health"), None);
    }

    #[test]
    fn test_short_key_skips_tag() {
        let key = derive_key("GET", "/api/v1/posts", "ua");
        let short = short_key(&key);
        assert_eq!(short.len(), SHORT_KEY_LEN);
        assert!(key.starts_with("posts:"));
        assert_eq!(&key["posts:".len().."posts:".len() + SHORT_KEY_LEN], short);
    }

    #[test]
    fn test_resource_from_str() {
        assert_eq!("media".parse::<Resource>().unwrap(), Resource::Media);
        assert!(matches!(
            "users".parse::<Resource>(),
            Err(CacheError::InvalidRequest(_))
        ));
    }
}

//! Configuration Module
//!
//! Handles loading server, cache and Redis settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

// == Server Config ==
/// Top-level configuration for the binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Response cache settings
    pub cache: CacheConfig,
}

// == Cache Config ==
/// Settings for the response cache and its two tiers.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false no cache manager is built and requests pass straight through
    pub enabled: bool,
    /// TTL in seconds applied by the middleware to captured responses
    pub ttl_secs: u64,
    /// Local store sweep interval in seconds
    pub cleanup_interval_secs: u64,
    /// Networked tier connection settings
    pub redis: RedisConfig,
}

// == Redis Config ==
/// Connection settings for the networked store.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Empty means no AUTH
    pub password: Option<String>,
    /// Logical database index
    pub db: i64,
    /// Namespace prepended to every key
    pub key_prefix: String,
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CACHE_ENABLED` - Build the cache manager at all (default: true)
    /// - `CACHE_TTL` - Response TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Local sweep frequency in seconds (default: 300)
    /// - `REDIS_*` - see [`RedisConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            server_port: env_or("SERVER_PORT", 8080),
            cache: CacheConfig::from_env(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_or("CACHE_ENABLED", true),
            ttl_secs: env_or("CACHE_TTL", 300),
            cleanup_interval_secs: env_or("CLEANUP_INTERVAL", 300),
            redis: RedisConfig::from_env(),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl RedisConfig {
    /// # Environment Variables
    /// - `REDIS_HOST` (default: localhost)
    /// - `REDIS_PORT` (default: 6379)
    /// - `REDIS_PASSWORD` (default: none)
    /// - `REDIS_DB` (default: 0)
    /// - `REDIS_PREFIX` (default: `cms_cache:`)
    /// - `REDIS_CONNECT_TIMEOUT_MS` (default: 5000)
    /// - `REDIS_RESPONSE_TIMEOUT_MS` (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("REDIS_HOST")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.host),
            port: env_or("REDIS_PORT", defaults.port),
            password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
            db: env_or("REDIS_DB", defaults.db),
            key_prefix: env::var("REDIS_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.key_prefix),
            connect_timeout_ms: env_or("REDIS_CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms),
            response_timeout_ms: env_or("REDIS_RESPONSE_TIMEOUT_MS", defaults.response_timeout_ms),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// `host:port`, used in logs and the stats view.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            cleanup_interval_secs: 300,
            redis: RedisConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
            key_prefix: "cms_cache:".to_string(),
            connect_timeout_ms: 5000,
            response_timeout_ms: 3000,
        }
    }
}

/// Reads and parses an env var, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.cleanup_interval(), Duration::from_secs(300));
        assert_eq!(config.cache.redis.key_prefix, "cms_cache:");
        assert_eq!(config.cache.redis.address(), "localhost:6379");
        assert!(config.cache.redis.password.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        for name in [
            "SERVER_PORT",
            "CACHE_ENABLED",
            "CACHE_TTL",
            "CLEANUP_INTERVAL",
            "REDIS_HOST",
            "REDIS_PORT",
            "REDIS_PASSWORD",
            "REDIS_DB",
            "REDIS_PREFIX",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.cache.redis.db, 0);
        assert_eq!(config.cache.redis.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.cache.redis.response_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_env_or_ignores_malformed_values() {
        env::set_var("RESPONSE_CACHE_TEST_PORT", "not-a-number");
        assert_eq!(env_or("RESPONSE_CACHE_TEST_PORT", 42u16), 42);
        env::remove_var("RESPONSE_CACHE_TEST_PORT");
    }
}

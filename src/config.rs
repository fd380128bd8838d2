//! Configuration Module
//!
//! Connection and caching parameters. The library takes a `Config` value;
//! `from_env` is a convenience for the demo binary.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which store implementation backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Remote Redis server
    Redis,
    /// In-process store with TTL support
    Memory,
}

impl Backend {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "redis" => Some(Backend::Redis),
            "memory" => Some(Backend::Memory),
            _ => None,
        }
    }
}

/// Cache configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store implementation
    pub backend: Backend,
    /// Store host name
    pub host: String,
    /// Store port
    pub port: u16,
    /// Store database index
    pub db: u32,
    /// Default TTL in seconds for cache wrappers without explicit TTL (0 = none)
    pub default_ttl: u64,
    /// Namespace prepended to every key
    pub prefix: String,
    /// Timeout applied to each store call, in milliseconds
    pub timeout_ms: u64,
    /// Memory backend sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_BACKEND` - `redis` or `memory` (default: redis)
    /// - `MEMO_HOST` - Store host (default: 127.0.0.1)
    /// - `MEMO_PORT` - Store port (default: 6379)
    /// - `MEMO_DB` - Database index (default: 10)
    /// - `MEMO_DEFAULT_TTL` - Default TTL in seconds, 0 disables (default: 0)
    /// - `MEMO_PREFIX` - Key namespace (default: demo)
    /// - `MEMO_TIMEOUT_MS` - Per-call store timeout (default: 2000)
    /// - `MEMO_CLEANUP_INTERVAL` - Memory backend sweep interval (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env::var("MEMO_BACKEND")
                .ok()
                .and_then(|v| Backend::parse(&v))
                .unwrap_or(defaults.backend),
            host: env::var("MEMO_HOST").unwrap_or(defaults.host),
            port: parse_var("MEMO_PORT").unwrap_or(defaults.port),
            db: parse_var("MEMO_DB").unwrap_or(defaults.db),
            default_ttl: parse_var("MEMO_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            prefix: env::var("MEMO_PREFIX").unwrap_or(defaults.prefix),
            timeout_ms: parse_var("MEMO_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
            cleanup_interval: parse_var("MEMO_CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Connection URL for the configured Redis database.
    pub fn store_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    /// Default TTL, `None` when configured as 0.
    pub fn default_ttl(&self) -> Option<u64> {
        (self.default_ttl > 0).then_some(self.default_ttl)
    }

    /// Per-call store timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Redis,
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 10,
            default_ttl: 0,
            prefix: "demo".to_string(),
            timeout_ms: 2000,
            cleanup_interval: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Redis);
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 10);
        assert_eq!(config.prefix, "demo");
        assert_eq!(config.default_ttl(), None);
        assert_eq!(config.timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_store_url() {
        let config = Config {
            host: "cache.local".to_string(),
            port: 6380,
            db: 3,
            ..Config::default()
        };
        assert_eq!(config.store_url(), "redis://cache.local:6380/3");
    }

    #[test]
    fn test_default_ttl_nonzero() {
        let config = Config {
            default_ttl: 60,
            ..Config::default()
        };
        assert_eq!(config.default_ttl(), Some(60));
    }

    #[test]
    fn test_config_from_env() {
        // One test owns the MEMO_* vars so parallel tests never race on them
        env::set_var("MEMO_BACKEND", "MEMORY");
        env::set_var("MEMO_PORT", "6390");
        env::set_var("MEMO_DB", "4");
        env::set_var("MEMO_DEFAULT_TTL", "120");
        env::set_var("MEMO_PREFIX", "reports");
        env::set_var("MEMO_TIMEOUT_MS", "not-a-number");

        let config = Config::from_env();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.port, 6390);
        assert_eq!(config.db, 4);
        assert_eq!(config.default_ttl(), Some(120));
        assert_eq!(config.prefix, "reports");
        assert_eq!(config.timeout_ms, 2000, "unparsable value falls back to default");

        // Unknown backend falls back, cleared vars give defaults
        env::set_var("MEMO_BACKEND", "memcached");
        for name in [
            "MEMO_HOST",
            "MEMO_PORT",
            "MEMO_DB",
            "MEMO_DEFAULT_TTL",
            "MEMO_PREFIX",
            "MEMO_TIMEOUT_MS",
            "MEMO_CLEANUP_INTERVAL",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.backend, Backend::Redis);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 10);
        assert_eq!(config.default_ttl(), None);
        assert_eq!(config.prefix, "demo");
        assert_eq!(config.cleanup_interval, 1);

        env::remove_var("MEMO_BACKEND");
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(Backend::parse("Memory"), Some(Backend::Memory));
        assert_eq!(Backend::parse("redis"), Some(Backend::Redis));
        assert_eq!(Backend::parse("memcached"), None);
    }
}

//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Networked cache backend URL; `None` selects the in-process store
    pub redis_url: Option<String>,
    /// Upper bound on the startup connection attempt, in milliseconds
    pub redis_connect_timeout_ms: u64,
    /// Default TTL in seconds for cache writes without explicit TTL
    pub default_ttl: u64,
    /// TTL in seconds for route-level response caching
    pub response_cache_ttl: u64,
    /// Maximum number of entries the in-process store can hold
    pub max_entries: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background maintenance interval in seconds
    pub maintenance_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Networked cache URL (default: unset, in-process store)
    /// - `REDIS_CONNECT_TIMEOUT_MS` - Startup connect timeout (default: 2000)
    /// - `DEFAULT_TTL` - Default cache TTL in seconds (default: 3600)
    /// - `RESPONSE_CACHE_TTL` - Response cache TTL in seconds (default: 300)
    /// - `MAX_ENTRIES` - In-process store capacity (default: 10000)
    /// - `SERVER_PORT` - HTTP server port (default: 5000)
    /// - `MAINTENANCE_INTERVAL` - Sweep/probe frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            redis_connect_timeout_ms: parse_or("REDIS_CONNECT_TIMEOUT_MS", defaults.redis_connect_timeout_ms),
            default_ttl: parse_or("DEFAULT_TTL", defaults.default_ttl),
            response_cache_ttl: parse_or("RESPONSE_CACHE_TTL", defaults.response_cache_ttl),
            max_entries: parse_or("MAX_ENTRIES", defaults.max_entries),
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            maintenance_interval: parse_or("MAINTENANCE_INTERVAL", defaults.maintenance_interval),
        }
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis_connect_timeout_ms: 2000,
            default_ttl: 3600,
            response_cache_ttl: 300,
            max_entries: 10_000,
            server_port: 5000,
            maintenance_interval: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.response_cache_ttl, 300);
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.maintenance_interval, 30);
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        env::set_var("ALUMNI_CACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(parse_or("ALUMNI_CACHE_TEST_GARBAGE", 42u64), 42);
        env::remove_var("ALUMNI_CACHE_TEST_GARBAGE");
    }

    #[test]
    fn test_parse_or_reads_value() {
        env::set_var("ALUMNI_CACHE_TEST_VALUE", "17");
        assert_eq!(parse_or("ALUMNI_CACHE_TEST_VALUE", 42u64), 17);
        env::remove_var("ALUMNI_CACHE_TEST_VALUE");
    }
}

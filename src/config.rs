//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::{TtlPolicy, DEFAULT_MAX_TRACKED_KEYS};

/// Which key/value store backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store implementation to use
    pub store_backend: StoreBackend,
    /// Connection URL for the Redis backend
    pub redis_url: String,
    /// Upper bound for a single store call in milliseconds
    pub store_timeout_ms: u64,
    /// TTL in seconds for keys whose entity type has no table entry
    pub default_ttl: u64,
    /// Raw `entity=secs,...` overrides layered over the reference TTL table
    pub ttl_overrides: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds (memory backend only)
    pub cleanup_interval: u64,
    /// Capacity of the metrics event channel
    pub metrics_buffer: usize,
    /// Per-key stats records kept before the least recently seen are evicted
    pub stats_max_keys: usize,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - Redis connection URL (default: redis://127.0.0.1:6379/0)
    /// - `STORE_TIMEOUT_MS` - Per-call store timeout (default: 2000)
    /// - `DEFAULT_TTL` - Fallback TTL in seconds (default: 3600)
    /// - `CACHE_TTL_OVERRIDES` - e.g. `product=120,cart=30` (default: none)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `METRICS_BUFFER` - Metrics channel capacity (default: 1024)
    /// - `STATS_MAX_KEYS` - Per-key stats records kept (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_backend: env_or("STORE_BACKEND", defaults.store_backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            ttl_overrides: env::var("CACHE_TTL_OVERRIDES")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            metrics_buffer: env_or("METRICS_BUFFER", defaults.metrics_buffer),
            stats_max_keys: env_or("STATS_MAX_KEYS", defaults.stats_max_keys),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Builds the TTL table: reference entries, the configured default, then overrides.
    ///
    /// Malformed override entries are logged and skipped.
    pub fn ttl_policy(&self) -> TtlPolicy {
        let mut policy =
            TtlPolicy::reference().with_default(Duration::from_secs(self.default_ttl));

        let Some(raw) = self.ttl_overrides.as_deref() else {
            return policy;
        };

        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let parsed = item
                .split_once('=')
                .and_then(|(entity, secs)| {
                    let entity = entity.trim();
                    let secs: u64 = secs.trim().parse().ok()?;
                    (!entity.is_empty()).then(|| (entity.to_string(), secs))
                });

            match parsed {
                Some((entity, secs)) => {
                    policy = policy.with_entry(entity, Duration::from_secs(secs));
                }
                None => warn!("Ignoring malformed TTL override '{}'", item),
            }
        }

        policy
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            store_timeout_ms: 2000,
            default_ttl: 3600,
            ttl_overrides: None,
            server_port: 3000,
            cleanup_interval: 1,
            metrics_buffer: 1024,
            stats_max_keys: DEFAULT_MAX_TRACKED_KEYS,
        }
    }
}

//! Response DTOs for the cache diagnostics API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{CacheStats, KeyMetrics, StatusReport};

/// Characters of a stored value shown by the inspect endpoint.
pub const INSPECT_PREVIEW_CHARS: usize = 500;

/// Response body for GET /api/cache-debug/status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub available: bool,
    pub total_keys: u64,
    pub keys: Vec<String>,
    /// "UP" or "DOWN"
    pub status: &'static str,
}

impl From<StatusReport> for StatusResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            status: if report.available { "UP" } else { "DOWN" },
            available: report.available,
            total_keys: report.total_keys,
            keys: report.keys.into_iter().collect(),
        }
    }
}

/// Response body for GET /api/cache-debug/key/:key
#[derive(Debug, Clone, Serialize)]
pub struct InspectResponse {
    pub key: String,
    pub exists: bool,
    /// Preview of the stored text; always ends in "..." when present
    pub value: Option<String>,
    /// Full length of the stored text in characters
    pub length: usize,
}

impl InspectResponse {
    /// Builds the response from the raw stored text, if any.
    pub fn new(key: impl Into<String>, raw: Option<String>) -> Self {
        let key = key.into();
        match raw {
            Some(raw) => {
                let length = raw.chars().count();
                let mut value: String = raw.chars().take(INSPECT_PREVIEW_CHARS).collect();
                value.push_str("...");
                Self {
                    key,
                    exists: true,
                    value: Some(value),
                    length,
                }
            }
            None => Self {
                key,
                exists: false,
                value: None,
                length: 0,
            },
        }
    }
}

/// Response body for GET|POST /api/cache-debug/clear-all
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub deleted_count: u64,
    pub message: String,
    pub status: &'static str,
}

impl ClearResponse {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            deleted_count,
            message: format!("Cleared {} cache keys", deleted_count),
            status: "success",
        }
    }
}

/// Response body for GET /api/cache-debug/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of reads that ran the loader
    pub misses: u64,
    /// Store faults absorbed on the read path
    pub fallbacks: u64,
    pub writes: u64,
    pub invalidations: u64,
    /// Per-key records dropped to respect the tracking limit
    pub evicted_records: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Per-key records, ordered by key
    pub keys: BTreeMap<String, KeyMetrics>,
}

impl From<&CacheStats> for StatsResponse {
    fn from(stats: &CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            fallbacks: stats.fallbacks,
            writes: stats.writes,
            invalidations: stats.invalidations,
            evicted_records: stats.evicted_records,
            hit_rate: stats.hit_rate(),
            keys: stats
                .keys
                .iter()
                .map(|(key, metrics)| (key.clone(), metrics.clone()))
                .collect(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

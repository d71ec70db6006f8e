//! API Handlers
//!
//! HTTP request handlers for the cache diagnostics endpoints. Every handler
//! talks to the store through `Diagnostics`; none of them decode values.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheStats, Diagnostics, ReadThroughCache};
use crate::error::{ApiError, ApiResult};
use crate::models::{ClearResponse, HealthResponse, InspectResponse, StatsResponse, StatusResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read-through engine used by the application
    pub cache: ReadThroughCache,
    pub diagnostics: Diagnostics,
    /// Counters folded in by the metrics task
    pub stats: Arc<RwLock<CacheStats>>,
}

impl AppState {
    /// Creates a new AppState with empty statistics.
    pub fn new(cache: ReadThroughCache) -> Self {
        Self::with_stats(cache, Arc::new(RwLock::new(CacheStats::new())))
    }

    /// Creates a new AppState sharing `stats` with a running metrics task.
    pub fn with_stats(cache: ReadThroughCache, stats: Arc<RwLock<CacheStats>>) -> Self {
        Self {
            diagnostics: Diagnostics::new(cache.clone()),
            cache,
            stats,
        }
    }
}

/// Handler for GET /api/cache-debug/status
///
/// Reports availability and the current key set. Never fails: an
/// unreachable store is reported as `DOWN`.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let report = state.diagnostics.status().await;
    Json(StatusResponse::from(report))
}

/// Handler for GET /api/cache-debug/key/:key
pub async fn inspect_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<InspectResponse>> {
    if key.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Key cannot be empty".to_string()));
    }

    let raw = state.diagnostics.peek(&key).await?;

    Ok(Json(InspectResponse::new(key, raw)))
}

/// Handler for GET|POST /api/cache-debug/clear-all
pub async fn clear_all_handler(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let deleted = state.diagnostics.clear_all().await?;

    Ok(Json(ClearResponse::new(deleted)))
}

/// Handler for GET /api/cache-debug/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    // Acquire read lock for stats
    let stats = state.stats.read().await;

    Json(StatsResponse::from(&*stats))
}

/// Handler for GET /health
///
/// Liveness of the process only; store health is reported by /status.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

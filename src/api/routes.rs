//! API Routes
//!
//! Configures the Axum router with the cache diagnostics endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_all_handler, health_handler, inspect_handler, stats_handler, status_handler, AppState,
};

/// Prefix shared by the operator-facing endpoints.
pub const DIAGNOSTICS_PREFIX: &str = "/api/cache-debug";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/cache-debug/status` - Availability and key listing
/// - `GET /api/cache-debug/key/:key` - Raw value preview
/// - `GET|POST /api/cache-debug/clear-all` - Drop every key
/// - `GET /api/cache-debug/stats` - Hit/miss counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let diagnostics = Router::new()
        .route("/status", get(status_handler))
        .route("/key/:key", get(inspect_handler))
        .route("/clear-all", get(clear_all_handler).post(clear_all_handler))
        .route("/stats", get(stats_handler));

    Router::new()
        .nest(DIAGNOSTICS_PREFIX, diagnostics)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

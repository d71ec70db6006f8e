//! API Module
//!
//! HTTP handlers and routing for the cache diagnostics surface.
//!
//! # Endpoints
//! - `GET /api/cache-debug/status` - Store availability and keys
//! - `GET /api/cache-debug/key/:key` - Inspect a raw stored value
//! - `GET|POST /api/cache-debug/clear-all` - Remove every key
//! - `GET /api/cache-debug/stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, DIAGNOSTICS_PREFIX};

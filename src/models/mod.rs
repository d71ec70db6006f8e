//! Response models for the cache diagnostics API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::{
    ClearResponse, HealthResponse, InspectResponse, StatsResponse, StatusResponse,
    INSPECT_PREVIEW_CHARS,
};

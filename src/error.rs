//! Error types for the cache layer
//!
//! Store and codec faults are infrastructure errors: the engine absorbs them.
//! `ApiError` is what the diagnostics endpoints return to operators.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error Enum ==
/// Failure reported by a `KeyValueStore` backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not be reached (connection refused, dropped, I/O)
    #[error("store unavailable during {op}: {message}")]
    Unavailable { op: &'static str, message: String },

    /// Backend did not answer within the configured timeout
    #[error("store operation {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// Backend answered with an error for this command
    #[error("store rejected {op}: {message}")]
    Command { op: &'static str, message: String },
}

impl StoreError {
    /// Name of the store operation that failed.
    pub fn op(&self) -> &'static str {
        match self {
            StoreError::Unavailable { op, .. }
            | StoreError::Timeout { op, .. }
            | StoreError::Command { op, .. } => op,
        }
    }
}

/// Result returned by every store call.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Codec Error Enum ==
/// Failure converting a value to or from its wire text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("failed to encode value: {message}")]
    Encode { message: String },

    #[error("cached payload does not match shape {shape}: {message}")]
    Decode { shape: String, message: String },
}

// == Api Error Enum ==
/// Error type for the diagnostics HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The cache backend failed while serving a diagnostics call
    #[error("Cache store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the diagnostics handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

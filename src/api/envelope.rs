//! Response bodies for the pipeline endpoints.
//!
//! Success: `{ "status": "success", "sentinel_output": ..., "guardian_output": ..., "responder_output": ... }`
//! Error:   `{ "status": "error", "message": "..." }`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::types::PipelineResult;

/// Completed run: the three stage outputs beside a success marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub status: String,
    #[serde(flatten)]
    pub result: PipelineResult,
}

impl RunResponse {
    pub fn success(result: PipelineResult) -> Response {
        let body = Self {
            status: "success".to_string(),
            result,
        };
        (StatusCode::OK, axum::Json(body)).into_response()
    }
}

/// A run that could not produce a result at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn internal(message: impl Into<String>) -> Response {
        let body = Self {
            status: "error".to_string(),
            message: message.into(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

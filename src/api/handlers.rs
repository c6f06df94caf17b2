//! API request handlers

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::{error, info};

use super::envelope::{ErrorResponse, HealthResponse, RunResponse};
use crate::agents::Orchestrator;
use crate::config::defaults;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

impl ApiState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// GET|POST /api/run - execute one independent pipeline run.
///
/// The run executes in its own task so a panic surfaces as a join error and
/// becomes a 500 response instead of tearing down the connection.
pub async fn run_pipeline(State(state): State<ApiState>) -> Response {
    info!("Pipeline run requested");
    let orchestrator = Arc::clone(&state.orchestrator);

    match tokio::spawn(async move { orchestrator.run().await }).await {
        Ok(result) => RunResponse::success(result),
        Err(e) => {
            error!(error = %e, "Pipeline run aborted");
            let message = if e.is_panic() {
                "pipeline run panicked".to_string()
            } else {
                format!("pipeline run failed: {e}")
            };
            ErrorResponse::internal(message)
        }
    }
}

/// GET /health - liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: defaults::SERVICE_NAME.to_string(),
    })
}

//! API route definitions
//!
//! - /api/run - run the Sentinel → Guardian → Responder workflow (GET or POST)
//! - /health  - liveness probe

use axum::{routing::get, Router};

use super::handlers::{self, ApiState};

/// Pipeline routes, mounted under `/api`.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/run", get(handlers::run_pipeline).post(handlers::run_pipeline))
        .with_state(state)
}

/// Health endpoint at root level
pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::health_check))
}

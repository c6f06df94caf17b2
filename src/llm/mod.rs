//! Generation Backend Module
//!
//! Provides the interface the agents use to reach a text-generation service,
//! plus capability (model) selection with graceful fallback.
//!
//! ## Architecture
//!
//! - **GenerationBackend**: discover capabilities, bind a capability, generate text
//! - **GeminiBackend**: Google Generative Language REST implementation
//! - **ModelSelector**: resolves a per-stage preference list to one available id
//!
//! Backends are shared read-only between concurrent pipeline runs; they hold
//! no per-run state.

use async_trait::async_trait;

mod gemini;
mod selector;

pub use gemini::{ApiKey, GeminiBackend, API_KEY_ENV_VAR};
pub use selector::{CapabilityPreferences, ModelSelector, Selection};

/// Errors raised by a generation backend.
///
/// These never escape an agent; they are converted into embedded error text.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid capability id '{0}'")]
    InvalidCapability(String),
    #[error("Backend returned no text: {0}")]
    EmptyResponse(String),
    #[error("Malformed backend response: {0}")]
    Malformed(String),
    #[error("{operation} timed out after {secs}s")]
    TimedOut { operation: &'static str, secs: f64 },
}

/// Unified trait for text-generation backends
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// List the capability ids currently usable for text generation.
    async fn discover_capabilities(&self) -> Result<Vec<String>, BackendError>;

    /// Check that a capability can be bound to an agent.
    ///
    /// Called once per agent at construction; a failure marks the agent
    /// unavailable for the run.
    fn bind(&self, capability: &str) -> Result<(), BackendError> {
        if capability.trim().is_empty() {
            Err(BackendError::InvalidCapability(capability.to_string()))
        } else {
            Ok(())
        }
    }

    /// Generate text with `capability` under the persona `instructions`.
    async fn generate(
        &self,
        capability: &str,
        instructions: &str,
        input: &str,
    ) -> Result<String, BackendError>;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;
}

//! Stage outputs and the aggregated pipeline result

use serde::{Deserialize, Serialize};

use super::{ClassificationError, Stage};

/// Why a stage produced no generated text.
///
/// The `Display` form is the text that occupies the stage's output slot, so
/// the formats here are part of the pipeline's observable behaviour.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    /// The agent could not be bound to its capability
    #[error("Error: {agent} model is not initialized.")]
    Unavailable { agent: String, reason: String },

    /// The backend call failed
    #[error("Error processing request: {cause}")]
    Generation { agent: String, cause: String },

    /// The backend call exceeded the per-call timeout
    #[error("Error processing request: {agent} timed out after {secs}s")]
    TimedOut { agent: String, secs: f64 },

    /// Deterministic classification rejected the metrics
    #[error("Error: Guardian could not classify metrics: {0}")]
    Classification(ClassificationError),

    /// The stage was not invoked because an earlier stage failed
    #[error("Skipped: {stage} was not run because {upstream} failed.")]
    Skipped { stage: Stage, upstream: Stage },
}

/// Result of one stage: generated text or a structured error.
///
/// All variants render to text; the orchestrator decides whether an
/// error-shaped output is forwarded to the next stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Text(String),
    Failed(StageError),
    /// Fallback text produced after the stage's backend call failed. The
    /// text carries the error; the stage still counts as failed.
    Degraded { text: String, error: StageError },
}

impl StageOutput {
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Degraded { .. })
    }

    /// Error behind a failed or degraded output.
    pub const fn error(&self) -> Option<&StageError> {
        match self {
            Self::Text(_) => None,
            Self::Failed(err) | Self::Degraded { error: err, .. } => Some(err),
        }
    }

    /// Text that occupies the output slot.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) | Self::Degraded { text, .. } => text.clone(),
            Self::Failed(err) => err.to_string(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Degraded { text, .. } => text,
            Self::Failed(err) => err.to_string(),
        }
    }
}

impl From<StageError> for StageOutput {
    fn from(err: StageError) -> Self {
        Self::Failed(err)
    }
}

/// Aggregated output of one pipeline run.
///
/// Always three strings; a failed stage contributes its error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub sentinel_output: String,
    pub guardian_output: String,
    pub responder_output: String,
}

impl PipelineResult {
    /// Output slot of a stage.
    pub fn output(&self, stage: Stage) -> &str {
        match stage {
            Stage::Sentinel => &self.sentinel_output,
            Stage::Guardian => &self.guardian_output,
            Stage::Responder => &self.responder_output,
        }
    }
}

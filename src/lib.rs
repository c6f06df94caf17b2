//! ASAL-Guardian: Drought Early Warning for Kenya's Arid and Semi-Arid Lands
//!
//! Three-agent pipeline that turns a county field report into actionable
//! warnings.
//!
//! ## Architecture
//!
//! - **Sentinel Agent**: structures raw field data (VCI, water distance, market prices)
//! - **Guardian Agent**: classifies drought phase and economic status against NDMA thresholds
//! - **Responder Agent**: writes a bilingual SMS alert and a County Governor brief
//! - **LLM Module**: generation backend trait, Gemini client and model selection
//! - **API**: HTTP surface for on-demand runs

pub mod config;
pub mod types;
pub mod llm;
pub mod agents;
pub mod api;
pub mod console;

// Re-export configuration
pub use config::GuardianConfig;

// Re-export commonly used types
pub use types::{
    ActionArtifacts, Analysis, DroughtPhase, EconomicStatus, PipelineResult, Stage, StageError,
    StageOutput, StructuredMetrics,
};

// Re-export agents
pub use agents::{FieldReportSource, Orchestrator, SimulatedFieldReport};

// Re-export backend components
pub use llm::{BackendError, GeminiBackend, GenerationBackend};

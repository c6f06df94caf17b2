//! Multi-agent drought early-warning pipeline
//!
//! ## Pipeline Agents
//!
//! - **Sentinel**: structures a raw field report into metrics (VCI, water distance, prices)
//! - **Guardian**: classifies drought phase and economic status against NDMA thresholds
//! - **Responder**: writes a bilingual SMS alert and a brief for the County Governor
//!
//! All three share one generic `Agent`; the differences live in their
//! persona text and the per-stage functions in `stages`.

pub mod agent;
pub mod orchestrator;
pub mod personas;
pub mod stages;

pub use agent::{Agent, AgentPersona, BindingState, InvocationSettings};
pub use orchestrator::Orchestrator;
pub use stages::{FieldReportSource, SimulatedFieldReport};

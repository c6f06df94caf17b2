//! Per-stage behaviour layered on the generic agent
//!
//! ## Stages
//!
//! 1. **Sentinel** - acquires the field report and asks for structured metrics
//! 2. **Guardian** - applies NDMA thresholds to the Sentinel's metrics
//! 3. **Responder** - normalizes the SMS alert and governor brief
//!
//! Each stage is a set of pure functions around one `Agent::invoke` call; the
//! orchestrator wires them together.

pub mod sentinel;
pub mod guardian;
pub mod responder;

pub use sentinel::{extraction_prompt, FieldReportSource, SimulatedFieldReport};
pub use guardian::{analyze, classify_drought, classify_economy, terms_of_trade, Classification};
pub use responder::{sanitize_sms, single_paragraph};

//! Shared data structures for the drought early-warning pipeline
//!
//! This module defines the values that flow between stages:
//! - Stage: the three pipeline positions (Sentinel, Guardian, Responder)
//! - StructuredMetrics: what the Sentinel extracts from a field report
//! - Analysis: the Guardian's drought phase + economic status
//! - ActionArtifacts: the Responder's SMS alert and governor brief
//! - StageOutput / PipelineResult: what the orchestrator aggregates
//!
//! Stages exchange plain text; the typed values here are only produced by
//! the post-processors that need them.

mod stage;
mod metrics;
mod analysis;
mod artifacts;
mod pipeline;
mod embedded_json;

pub use stage::*;
pub use metrics::*;
pub use analysis::*;
pub use artifacts::*;
pub use pipeline::*;
pub use embedded_json::extract_json_object;

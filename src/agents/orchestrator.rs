//! Orchestrator - sequential Sentinel → Guardian → Responder workflow
//!
//! Every run selects a capability per stage, builds three fresh agents and
//! executes them strictly in order. Each stage receives exactly the text the
//! previous stage returned.
//!
//! ## Error propagation
//!
//! By default an error-shaped output is forwarded like any other text, so a
//! failed Sentinel still produces Guardian and Responder calls. With
//! `pipeline.halt_on_stage_error` later stages are skipped instead and their
//! slots name the stage that failed.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::agent::{Agent, InvocationSettings};
use super::personas;
use super::stages::{self, FieldReportSource};
use crate::config::{ConfigError, GuardianConfig};
use crate::llm::{CapabilityPreferences, GenerationBackend, ModelSelector};
use crate::types::{PipelineResult, Stage, StageError, StageOutput};

/// Runs the three-stage pipeline. Holds only shared, immutable state, so one
/// orchestrator can serve concurrent runs.
pub struct Orchestrator {
    config: Arc<GuardianConfig>,
    backend: Arc<dyn GenerationBackend>,
    reports: Arc<dyn FieldReportSource>,
    preferences: [CapabilityPreferences; 3],
}

impl Orchestrator {
    /// Create an orchestrator. Fails only if a stage has no usable
    /// capability preference.
    pub fn new(
        config: Arc<GuardianConfig>,
        backend: Arc<dyn GenerationBackend>,
        reports: Arc<dyn FieldReportSource>,
    ) -> Result<Self, ConfigError> {
        let resolve = |stage: Stage| {
            config.models.for_stage(stage).ok_or_else(|| {
                ConfigError::Validation(vec![format!(
                    "models.{} must list at least one non-empty capability id",
                    stage.config_key()
                )])
            })
        };
        let preferences = [
            resolve(Stage::Sentinel)?,
            resolve(Stage::Guardian)?,
            resolve(Stage::Responder)?,
        ];

        Ok(Self {
            config,
            backend,
            reports,
            preferences,
        })
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    fn preferences(&self, stage: Stage) -> &CapabilityPreferences {
        match stage {
            Stage::Sentinel => &self.preferences[0],
            Stage::Guardian => &self.preferences[1],
            Stage::Responder => &self.preferences[2],
        }
    }

    fn settings(&self) -> InvocationSettings {
        InvocationSettings {
            pacing: self.config.pipeline.pacing_delay(),
            timeout: self.config.backend.request_timeout(),
        }
    }

    /// Select a capability and bind a fresh agent for `stage`.
    async fn build_agent(&self, stage: Stage) -> Agent {
        let selector = ModelSelector::new(self.backend.as_ref(), self.config.backend.discovery_timeout());
        let capability = selector.select(self.preferences(stage)).await;
        Agent::bind(
            personas::for_stage(stage),
            capability,
            Arc::clone(&self.backend),
            self.settings(),
        )
    }

    /// Execute one full pipeline run. Always yields three output strings.
    pub async fn run(&self) -> PipelineResult {
        let started = Utc::now();
        info!(
            backend = self.backend.backend_name(),
            source = self.reports.source_name(),
            started_at = %started.to_rfc3339(),
            "Initiating ASAL-Guardian multi-agent workflow"
        );

        let sentinel = self.build_agent(Stage::Sentinel).await;
        let guardian = self.build_agent(Stage::Guardian).await;
        let responder = self.build_agent(Stage::Responder).await;
        info!("All agents initialized");

        let halt = self.config.pipeline.halt_on_stage_error;
        let mut failed_stage: Option<Stage> = None;

        // Sentinel: report → structured metrics text
        let report = self.reports.acquire_field_report().await;
        let sentinel_output = sentinel.invoke(&stages::extraction_prompt(&report)).await;
        note_failure(&mut failed_stage, Stage::Sentinel, &sentinel_output);
        let sentinel_text = sentinel_output.into_text();

        // Guardian: Sentinel text → analysis
        let guardian_output = match failed_stage {
            Some(upstream) if halt => skipped(Stage::Guardian, upstream),
            _ => {
                let raw = guardian.invoke(&sentinel_text).await;
                stages::guardian::finalize(&sentinel_text, raw, &self.config.thresholds)
            }
        };
        note_failure(&mut failed_stage, Stage::Guardian, &guardian_output);
        let guardian_text = guardian_output.into_text();

        // Responder: Guardian text → artifacts
        let responder_output = match failed_stage {
            Some(upstream) if halt => skipped(Stage::Responder, upstream),
            _ => {
                let raw = responder.invoke(&guardian_text).await;
                stages::responder::finalize(raw, &self.config.alerts)
            }
        };
        note_failure(&mut failed_stage, Stage::Responder, &responder_output);

        let elapsed_ms = (Utc::now() - started).num_milliseconds();
        match failed_stage {
            Some(stage) => warn!(first_failure = %stage, elapsed_ms, "Workflow complete with errors"),
            None => info!(elapsed_ms, "Workflow complete"),
        }

        PipelineResult {
            sentinel_output: sentinel_text,
            guardian_output: guardian_text,
            responder_output: responder_output.into_text(),
        }
    }
}

/// Remember the first stage whose output was an error. Skipped stages do
/// not replace the original failure.
fn note_failure(first: &mut Option<Stage>, stage: Stage, output: &StageOutput) {
    if first.is_none() && output.is_failure() {
        *first = Some(stage);
    }
}

fn skipped(stage: Stage, upstream: Stage) -> StageOutput {
    info!(stage = %stage, upstream = %upstream, "Skipping stage after upstream failure");
    StageError::Skipped { stage, upstream }.into()
}

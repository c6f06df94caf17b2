//! End-to-end pipeline tests against a scripted in-memory backend.
//!
//! Each test scripts the text every stage returns and checks what the
//! orchestrator handed to the next stage and what lands in the result.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use asal_guardian::agents::personas;
use asal_guardian::agents::FieldReportSource;
use asal_guardian::config::GuardianConfig;
use asal_guardian::llm::{BackendError, GenerationBackend};
use asal_guardian::types::{ActionArtifacts, Analysis, DroughtPhase, EconomicStatus, Stage};
use asal_guardian::{Orchestrator, SimulatedFieldReport};

// ============================================================================
// Scripted backend
// ============================================================================

#[derive(Debug, Clone)]
struct Call {
    stage: Stage,
    capability: String,
    input: String,
}

struct ScriptedBackend {
    available: Result<Vec<String>, String>,
    rejected: HashSet<String>,
    replies: [Result<String, String>; 3],
    hang: bool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    fn new(sentinel: &str, guardian: &str, responder: &str) -> Self {
        Self {
            available: Ok(vec![
                "models/gemini-2.5-flash".to_string(),
                "models/gemini-2.5-pro".to_string(),
            ]),
            rejected: HashSet::new(),
            replies: [
                Ok(sentinel.to_string()),
                Ok(guardian.to_string()),
                Ok(responder.to_string()),
            ],
            hang: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn input_of(&self, stage: Stage) -> Option<String> {
        self.calls()
            .into_iter()
            .find(|c| c.stage == stage)
            .map(|c| c.input)
    }
}

fn stage_of(instructions: &str) -> Stage {
    Stage::ALL
        .into_iter()
        .find(|s| personas::for_stage(*s).instructions == instructions)
        .unwrap()
}

const fn slot(stage: Stage) -> usize {
    match stage {
        Stage::Sentinel => 0,
        Stage::Guardian => 1,
        Stage::Responder => 2,
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn discover_capabilities(&self) -> Result<Vec<String>, BackendError> {
        self.available.clone().map_err(BackendError::Malformed)
    }

    fn bind(&self, capability: &str) -> Result<(), BackendError> {
        if self.rejected.contains(capability) {
            Err(BackendError::InvalidCapability(capability.to_string()))
        } else {
            Ok(())
        }
    }

    async fn generate(
        &self,
        capability: &str,
        instructions: &str,
        input: &str,
    ) -> Result<String, BackendError> {
        let stage = stage_of(instructions);
        self.calls.lock().unwrap().push(Call {
            stage,
            capability: capability.to_string(),
            input: input.to_string(),
        });
        if self.hang {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        self.replies[slot(stage)]
            .clone()
            .map_err(|m| BackendError::Status { status: 503, message: m })
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

fn orchestrator(config: GuardianConfig, backend: &Arc<ScriptedBackend>) -> Orchestrator {
    let backend: Arc<dyn GenerationBackend> = backend.clone();
    Orchestrator::new(Arc::new(config), backend, Arc::new(SimulatedFieldReport)).unwrap()
}

const SENTINEL_REPLY: &str = r#"```json
{
  "location": "Garissa County",
  "report_date": "October 2025",
  "vegetation_condition_index": {"value": 18.5, "period": "3-month"},
  "water_distance_km": {"current": 12, "previous_month": 8},
  "market_prices": {"goat_price_kes": 2500, "maize_price_kes_per_kg": 100}
}
```"#;

const GUARDIAN_REPLY: &str = r#"```json
{"drought_phase": "ALERT", "economic_status": "STABLE", "reasoning": "Pastoralists now trek 12 km for water."}
```"#;

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_stage_outputs_chain_into_next_inputs() {
    let long_sms = format!("Ukame mkali Garissa. {}", "Tafuteni msaada. ".repeat(20));
    let responder_reply = format!(
        "{{\"sms_alert\": \"{long_sms}\", \"governor_brief\": \"Your Excellency,\\n\\nGarissa is in ALARM. Activate the County Drought Contingency Fund.\"}}"
    );
    let backend = Arc::new(ScriptedBackend::new(SENTINEL_REPLY, GUARDIAN_REPLY, &responder_reply));

    let result = orchestrator(GuardianConfig::default(), &backend).run().await;

    // Sentinel receives the wrapped field report
    let sentinel_input = backend.input_of(Stage::Sentinel).unwrap();
    assert!(sentinel_input.starts_with("Extract the key metrics from this report and format as JSON: "));
    assert!(sentinel_input.contains("Garissa County - October 2025"));
    assert_eq!(result.sentinel_output, SENTINEL_REPLY);

    // Guardian input == Sentinel output; Responder input == Guardian output
    assert_eq!(backend.input_of(Stage::Guardian).unwrap(), result.sentinel_output);
    assert_eq!(backend.input_of(Stage::Responder).unwrap(), result.guardian_output);

    // Rules decide the classification, the model supplies the reasoning
    let analysis = Analysis::from_stage_text(&result.guardian_output).unwrap();
    assert_eq!(analysis.drought_phase, DroughtPhase::Alarm);
    assert_eq!(analysis.economic_status, EconomicStatus::Crisis);
    assert_eq!(analysis.reasoning, "Pastoralists now trek 12 km for water.");

    let artifacts = ActionArtifacts::from_stage_text(&result.responder_output).unwrap();
    assert!(artifacts.sms_alert.starts_with("NDMA ALERT:"));
    assert!(artifacts.sms_alert.chars().count() <= 160);
    assert!(!artifacts.governor_brief.contains('\n'));
}

#[tokio::test]
async fn test_preferred_capabilities_per_stage() {
    let backend = Arc::new(ScriptedBackend::new(SENTINEL_REPLY, GUARDIAN_REPLY, "{}"));
    orchestrator(GuardianConfig::default(), &backend).run().await;

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].capability, "models/gemini-2.5-flash");
    assert_eq!(calls[1].capability, "models/gemini-2.5-pro");
    assert_eq!(calls[2].capability, "models/gemini-2.5-pro");
}

#[tokio::test]
async fn test_fallback_to_available_capability() {
    let mut backend = ScriptedBackend::new(SENTINEL_REPLY, GUARDIAN_REPLY, "{}");
    backend.available = Ok(vec!["models/other".to_string()]);
    let backend = Arc::new(backend);
    orchestrator(GuardianConfig::default(), &backend).run().await;

    assert!(backend.calls().iter().all(|c| c.capability == "models/other"));
}

#[tokio::test]
async fn test_discovery_failure_uses_first_preference() {
    let mut backend = ScriptedBackend::new(SENTINEL_REPLY, GUARDIAN_REPLY, "{}");
    backend.available = Err("permission denied".to_string());
    let backend = Arc::new(backend);
    orchestrator(GuardianConfig::default(), &backend).run().await;

    let calls = backend.calls();
    assert_eq!(calls[0].capability, "models/gemini-2.5-flash");
    assert_eq!(calls[1].capability, "models/gemini-2.5-pro");
}

#[tokio::test]
async fn test_all_agents_unavailable_still_yields_three_strings() {
    let mut backend = ScriptedBackend::new("unused", "unused", "unused");
    backend.rejected = ["models/gemini-2.5-flash", "models/gemini-2.5-pro"]
        .into_iter()
        .map(str::to_string)
        .collect();
    let backend = Arc::new(backend);

    let result = orchestrator(GuardianConfig::default(), &backend).run().await;

    assert!(backend.calls().is_empty());
    assert_eq!(result.sentinel_output, "Error: Sentinel model is not initialized.");
    assert_eq!(result.guardian_output, "Error: Guardian model is not initialized.");
    assert_eq!(result.responder_output, "Error: Responder model is not initialized.");
}

#[tokio::test]
async fn test_sentinel_error_is_forwarded_as_guardian_input() {
    let mut backend = ScriptedBackend::new("unused", "I need data.", "No analysis available.");
    backend.replies[0] = Err("quota exceeded".to_string());
    let backend = Arc::new(backend);

    let result = orchestrator(GuardianConfig::default(), &backend).run().await;

    assert!(result.sentinel_output.starts_with("Error processing request: "));
    assert!(result.sentinel_output.contains("quota exceeded"));
    assert_eq!(backend.input_of(Stage::Guardian).unwrap(), result.sentinel_output);
    // No metrics to classify, so the Guardian's text passes through
    assert_eq!(result.guardian_output, "I need data.");
    assert_eq!(result.responder_output, "No analysis available.");
}

#[tokio::test]
async fn test_halt_on_stage_error_skips_later_stages() {
    let mut backend = ScriptedBackend::new("unused", "unused", "unused");
    backend.replies[0] = Err("quota exceeded".to_string());
    let backend = Arc::new(backend);
    let mut config = GuardianConfig::default();
    config.pipeline.halt_on_stage_error = true;

    let result = orchestrator(config, &backend).run().await;

    assert_eq!(backend.calls().len(), 1);
    assert_eq!(
        result.guardian_output,
        "Skipped: Guardian was not run because Sentinel failed."
    );
    assert_eq!(
        result.responder_output,
        "Skipped: Responder was not run because Sentinel failed."
    );
}

#[tokio::test]
async fn test_guardian_backend_failure_is_visible_and_halts() {
    let mut backend = ScriptedBackend::new(SENTINEL_REPLY, "unused", "unused");
    backend.replies[1] = Err("quota exhausted".to_string());
    let backend = Arc::new(backend);
    let mut config = GuardianConfig::default();
    config.pipeline.halt_on_stage_error = true;

    let result = orchestrator(config, &backend).run().await;

    let analysis = Analysis::from_stage_text(&result.guardian_output).unwrap();
    assert_eq!(analysis.drought_phase, DroughtPhase::Alarm);
    assert_eq!(analysis.economic_status, EconomicStatus::Crisis);
    let backend_error = analysis.backend_error.unwrap();
    assert!(backend_error.starts_with("Error processing request: "));
    assert!(backend_error.contains("503"));
    assert!(backend.input_of(Stage::Responder).is_none());
    assert_eq!(
        result.responder_output,
        "Skipped: Responder was not run because Guardian failed."
    );
}

#[tokio::test]
async fn test_guardian_backend_failure_still_feeds_responder() {
    let mut backend = ScriptedBackend::new(SENTINEL_REPLY, "unused", "raw responder");
    backend.replies[1] = Err("quota exhausted".to_string());
    let backend = Arc::new(backend);

    let result = orchestrator(GuardianConfig::default(), &backend).run().await;

    assert_eq!(backend.input_of(Stage::Responder).unwrap(), result.guardian_output);
    assert!(result.guardian_output.contains("backend_error"));
    assert_eq!(result.responder_output, "raw responder");
}

#[tokio::test]
async fn test_zero_maize_price_is_reported_not_panicked() {
    let sentinel = r#"{"vci": 18.5, "water_distance_km": 12, "goat_price": 2500, "maize_price": 0}"#;
    let backend = Arc::new(ScriptedBackend::new(sentinel, GUARDIAN_REPLY, "raw responder"));

    let result = orchestrator(GuardianConfig::default(), &backend).run().await;

    assert!(result
        .guardian_output
        .starts_with("Error: Guardian could not classify metrics:"));
    assert_eq!(backend.input_of(Stage::Responder).unwrap(), result.guardian_output);
    assert_eq!(result.responder_output, "raw responder");
}

#[tokio::test]
async fn test_stressed_economy_from_configured_run() {
    let sentinel = "VCI: 28\nWater distance: 5 km\nGoat price: 4000 KES\nMaize price: 100 KES/kg";
    let backend = Arc::new(ScriptedBackend::new(sentinel, "Conditions are deteriorating.", "{}"));

    let result = orchestrator(GuardianConfig::default(), &backend).run().await;

    let analysis = Analysis::from_stage_text(&result.guardian_output).unwrap();
    assert_eq!(analysis.drought_phase, DroughtPhase::Alert);
    assert_eq!(analysis.economic_status, EconomicStatus::Stressed);
    assert_eq!(analysis.reasoning, "Conditions are deteriorating.");
}

#[tokio::test]
async fn test_generation_timeout_is_embedded() {
    let mut backend = ScriptedBackend::new("unused", "unused", "unused");
    backend.hang = true;
    let backend = Arc::new(backend);
    let mut config = GuardianConfig::default();
    config.backend.request_timeout_secs = 1;
    config.pipeline.halt_on_stage_error = true;

    let result = orchestrator(config, &backend).run().await;

    assert_eq!(
        result.sentinel_output,
        "Error processing request: Sentinel timed out after 1s"
    );
    assert!(result.guardian_output.starts_with("Skipped:"));
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let backend = Arc::new(ScriptedBackend::new(SENTINEL_REPLY, GUARDIAN_REPLY, "{}"));
    let orch = Arc::new(orchestrator(GuardianConfig::default(), &backend));

    let (a, b) = tokio::join!(orch.run(), orch.run());

    assert_eq!(a, b);
    assert_eq!(backend.calls().len(), 6);
}

#[tokio::test]
async fn test_custom_field_report_source() {
    struct DrySpell;

    #[async_trait]
    impl FieldReportSource for DrySpell {
        async fn acquire_field_report(&self) -> String {
            "Field Report - Turkana - VCI 40, water 3km, goat 6000 KES, maize 100 KES".to_string()
        }

        fn source_name(&self) -> &'static str {
            "dry-spell"
        }
    }

    let backend = Arc::new(ScriptedBackend::new(SENTINEL_REPLY, GUARDIAN_REPLY, "{}"));
    let dyn_backend: Arc<dyn GenerationBackend> = backend.clone();
    let orch = Orchestrator::new(Arc::new(GuardianConfig::default()), dyn_backend, Arc::new(DrySpell)).unwrap();
    orch.run().await;

    assert!(backend.input_of(Stage::Sentinel).unwrap().contains("Turkana"));
}

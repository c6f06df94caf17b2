//! Generic agent: a persona bound to one generation capability
//!
//! An agent never raises. Binding failures, backend errors and timeouts all
//! come back as a `StageOutput::Failed` whose text is placed in the
//! pipeline result.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::llm::GenerationBackend;
use crate::types::{Stage, StageError, StageOutput};

/// Fixed name and instruction text of one pipeline role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentPersona {
    pub stage: Stage,
    pub instructions: &'static str,
}

impl AgentPersona {
    pub const fn name(&self) -> &'static str {
        self.stage.name()
    }
}

/// Whether the agent's capability was accepted by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingState {
    Bound,
    Unavailable { reason: String },
}

/// Per-call behaviour shared by all agents in a run.
#[derive(Debug, Clone, Copy)]
pub struct InvocationSettings {
    /// Delay before each backend call
    pub pacing: Duration,
    /// Upper bound on one backend call
    pub timeout: Duration,
}

/// One configured agent for a single pipeline run.
pub struct Agent {
    persona: AgentPersona,
    capability: String,
    backend: Arc<dyn GenerationBackend>,
    settings: InvocationSettings,
    binding: BindingState,
}

impl Agent {
    /// Bind `persona` to `capability`. A rejected capability leaves the
    /// agent unavailable rather than failing construction.
    pub fn bind(
        persona: AgentPersona,
        capability: String,
        backend: Arc<dyn GenerationBackend>,
        settings: InvocationSettings,
    ) -> Self {
        info!(agent = persona.name(), capability = %capability, "Initializing agent");
        let binding = match backend.bind(&capability) {
            Ok(()) => BindingState::Bound,
            Err(e) => {
                warn!(agent = persona.name(), capability = %capability, error = %e, "Failed to bind agent");
                BindingState::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        Self {
            persona,
            capability,
            backend,
            settings,
            binding,
        }
    }

    pub const fn persona(&self) -> &AgentPersona {
        &self.persona
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub const fn binding(&self) -> &BindingState {
        &self.binding
    }

    /// Send `input` to the backend under this agent's persona.
    pub async fn invoke(&self, input: &str) -> StageOutput {
        let name = self.persona.name();

        if let BindingState::Unavailable { reason } = &self.binding {
            return StageError::Unavailable {
                agent: name.to_string(),
                reason: reason.clone(),
            }
            .into();
        }

        info!(agent = name, "Agent is thinking");
        if !self.settings.pacing.is_zero() {
            tokio::time::sleep(self.settings.pacing).await;
        }

        let call = self
            .backend
            .generate(&self.capability, self.persona.instructions, input);

        match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(Ok(text)) => {
                info!(agent = name, chars = text.len(), "Agent responded");
                StageOutput::Text(text)
            }
            Ok(Err(e)) => {
                warn!(agent = name, error = %e, "Agent generation failed");
                StageError::Generation {
                    agent: name.to_string(),
                    cause: e.to_string(),
                }
                .into()
            }
            Err(_) => {
                warn!(agent = name, timeout_secs = self.settings.timeout.as_secs_f64(), "Agent timed out");
                StageError::TimedOut {
                    agent: name.to_string(),
                    secs: self.settings.timeout.as_secs_f64(),
                }
                .into()
            }
        }
    }
}

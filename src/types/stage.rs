//! Pipeline stage identifiers

use serde::{Deserialize, Serialize};

/// Position of an agent in the fixed three-stage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Extracts structured metrics from the field report
    Sentinel,
    /// Classifies drought phase and economic status
    Guardian,
    /// Writes the SMS alert and governor brief
    Responder,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Self; 3] = [Self::Sentinel, Self::Guardian, Self::Responder];

    /// Agent name used in logs and embedded error strings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sentinel => "Sentinel",
            Self::Guardian => "Guardian",
            Self::Responder => "Responder",
        }
    }

    /// Key of this stage's preference list under `[models]`.
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Sentinel => "sentinel",
            Self::Guardian => "guardian",
            Self::Responder => "responder",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

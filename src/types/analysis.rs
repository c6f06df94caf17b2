//! Guardian analysis: drought phase, economic status and reasoning

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::extract_json_object;

/// NDMA drought early-warning phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DroughtPhase {
    Alarm,
    Alert,
    Normal,
}

impl DroughtPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alarm => "ALARM",
            Self::Alert => "ALERT",
            Self::Normal => "NORMAL",
        }
    }
}

impl std::fmt::Display for DroughtPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DroughtPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALARM" => Ok(Self::Alarm),
            "ALERT" => Ok(Self::Alert),
            "NORMAL" => Ok(Self::Normal),
            other => Err(format!("unknown drought phase '{other}'")),
        }
    }
}

/// Household economic status derived from terms of trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EconomicStatus {
    Crisis,
    Stressed,
    Stable,
}

impl EconomicStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crisis => "CRISIS",
            Self::Stressed => "STRESSED",
            Self::Stable => "STABLE",
        }
    }
}

impl std::fmt::Display for EconomicStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EconomicStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CRISIS" => Ok(Self::Crisis),
            "STRESSED" => Ok(Self::Stressed),
            "STABLE" => Ok(Self::Stable),
            other => Err(format!("unknown economic status '{other}'")),
        }
    }
}

/// Guardian output: the two classifications plus a short justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub drought_phase: DroughtPhase,
    pub economic_status: EconomicStatus,
    pub reasoning: String,
    /// Backend failure that forced a rule-based reasoning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_error: Option<String>,
}

impl Analysis {
    /// Parse an analysis from stage text (JSON, possibly fenced).
    pub fn from_stage_text(text: &str) -> Option<Self> {
        let json = extract_json_object(text)?;
        let phase = json.get("drought_phase")?.as_str()?.parse().ok()?;
        let status = json.get("economic_status")?.as_str()?.parse().ok()?;
        let reasoning = json
            .get("reasoning")
            .and_then(|r| r.as_str())
            .unwrap_or_default()
            .to_string();
        let backend_error = json
            .get("backend_error")
            .and_then(|e| e.as_str())
            .map(str::to_string);
        Some(Self {
            drought_phase: phase,
            economic_status: status,
            reasoning,
            backend_error,
        })
    }

    /// Render as the JSON text handed to the next stage.
    pub fn to_stage_text(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            format!(
                "{{\"drought_phase\": \"{}\", \"economic_status\": \"{}\"}}",
                self.drought_phase, self.economic_status
            )
        })
    }
}

/// Reasons the deterministic classification cannot be computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassificationError {
    #[error("maize price must be positive to compute terms of trade (got {0})")]
    NonPositiveMaizePrice(f64),
    #[error("{field} is not a finite number (got {value})")]
    NonFinite { field: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enums_serialize_uppercase() {
        assert_eq!(serde_json::to_string(&DroughtPhase::Alarm).unwrap(), "\"ALARM\"");
        assert_eq!(serde_json::to_string(&EconomicStatus::Stressed).unwrap(), "\"STRESSED\"");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("alert".parse::<DroughtPhase>(), Ok(DroughtPhase::Alert));
        assert_eq!(" Stable ".parse::<EconomicStatus>(), Ok(EconomicStatus::Stable));
        assert!("DROUGHT".parse::<DroughtPhase>().is_err());
    }

    #[test]
    fn test_stage_text_roundtrip_keys() {
        let analysis = Analysis {
            drought_phase: DroughtPhase::Alarm,
            economic_status: EconomicStatus::Crisis,
            reasoning: "Water distance exceeds 10 km.".to_string(),
            backend_error: None,
        };
        let text = analysis.to_stage_text();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["drought_phase"], "ALARM");
        assert_eq!(v["economic_status"], "CRISIS");
        assert!(v.get("backend_error").is_none());
        assert_eq!(Analysis::from_stage_text(&text), Some(analysis));
    }

    #[test]
    fn test_backend_error_is_carried_in_stage_text() {
        let analysis = Analysis {
            drought_phase: DroughtPhase::Alert,
            economic_status: EconomicStatus::Stressed,
            reasoning: "VCI 28 is within the alert band.".to_string(),
            backend_error: Some("Error processing request: HTTP 503".to_string()),
        };
        let text = analysis.to_stage_text();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["backend_error"], "Error processing request: HTTP 503");
        assert_eq!(Analysis::from_stage_text(&text), Some(analysis));
    }

    #[test]
    fn test_from_model_output_with_lowercase_values() {
        let text = "```json\n{\"drought_phase\": \"alarm\", \"economic_status\": \"crisis\"}\n```";
        let a = Analysis::from_stage_text(text).unwrap();
        assert_eq!(a.drought_phase, DroughtPhase::Alarm);
        assert!(a.reasoning.is_empty());
    }
}

//! Responder artifacts: SMS alert and governor brief

use serde::{Deserialize, Serialize};

use super::extract_json_object;

/// The two communication artifacts the Responder produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionArtifacts {
    /// Bilingual (English/Swahili) alert for pastoralists, one SMS segment
    pub sms_alert: String,
    /// Formal single-paragraph brief for the County Governor
    pub governor_brief: String,
}

impl ActionArtifacts {
    /// Parse artifacts from stage text (JSON, possibly fenced or wrapped in prose).
    pub fn from_stage_text(text: &str) -> Option<Self> {
        let json = extract_json_object(text)?;
        Some(Self {
            sms_alert: json.get("sms_alert")?.as_str()?.to_string(),
            governor_brief: json.get("governor_brief")?.as_str()?.to_string(),
        })
    }

    /// Render as JSON text for the pipeline result.
    pub fn to_stage_text(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            format!("sms_alert: {}\ngovernor_brief: {}", self.sms_alert, self.governor_brief)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_artifacts() {
        let text = "```json\n{\"sms_alert\": \"NDMA ALERT: Drought.\", \"governor_brief\": \"Your Excellency...\"}\n```";
        let a = ActionArtifacts::from_stage_text(text).unwrap();
        assert_eq!(a.sms_alert, "NDMA ALERT: Drought.");
        assert_eq!(a.governor_brief, "Your Excellency...");
    }

    #[test]
    fn test_missing_brief_is_not_artifacts() {
        assert!(ActionArtifacts::from_stage_text(r#"{"sms_alert": "NDMA ALERT: x"}"#).is_none());
    }
}

//! Responder stage: SMS and governor brief normalization

use tracing::{debug, warn};

use crate::config::AlertConfig;
use crate::types::{ActionArtifacts, StageOutput};

/// Collapse all whitespace runs (including newlines) to single spaces.
pub fn single_paragraph(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make an SMS fit one segment and carry the alert prefix.
///
/// The result starts with `prefix` and holds at most `max_chars` characters,
/// ending in `…` when it had to be cut.
pub fn sanitize_sms(text: &str, prefix: &str, max_chars: usize) -> String {
    let collapsed = single_paragraph(text);

    let has_prefix = collapsed
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix));

    let prefixed = if has_prefix {
        format!("{prefix}{}", &collapsed[prefix.len()..])
    } else if collapsed.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix} {collapsed}")
    };

    if prefixed.chars().count() <= max_chars {
        return prefixed;
    }

    let mut cut: String = prefixed.chars().take(max_chars.saturating_sub(1)).collect();
    // Trailing spaces go, but never into the prefix itself
    let keep = cut.trim_end().len().max(prefix.len().min(cut.len()));
    cut.truncate(keep);
    cut.push('…');
    cut
}

/// Turn the Responder agent's output into the stage result.
///
/// Parseable artifacts are normalized; anything else is returned untouched.
pub fn finalize(agent_output: StageOutput, alerts: &AlertConfig) -> StageOutput {
    let text = match agent_output {
        StageOutput::Text(text) => text,
        failed @ (StageOutput::Failed(_) | StageOutput::Degraded { .. }) => return failed,
    };

    let Some(artifacts) = ActionArtifacts::from_stage_text(&text) else {
        debug!("Responder output is not parseable artifacts; returning raw text");
        return StageOutput::Text(text);
    };

    let sms_alert = sanitize_sms(&artifacts.sms_alert, &alerts.sms_prefix, alerts.sms_max_chars);
    if sms_alert != single_paragraph(&artifacts.sms_alert) {
        warn!(
            original_chars = artifacts.sms_alert.chars().count(),
            final_chars = sms_alert.chars().count(),
            "SMS alert adjusted to fit transport limits"
        );
    }

    let normalized = ActionArtifacts {
        sms_alert,
        governor_brief: single_paragraph(&artifacts.governor_brief),
    };
    StageOutput::Text(normalized.to_stage_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StageError;

    const PREFIX: &str = "NDMA ALERT:";

    #[test]
    fn test_short_prefixed_sms_unchanged() {
        let sms = "NDMA ALERT: Drought ALARM in Garissa. Hatari ya ukame!";
        assert_eq!(sanitize_sms(sms, PREFIX, 160), sms);
    }

    #[test]
    fn test_missing_prefix_added() {
        assert_eq!(
            sanitize_sms("Drought ALARM.\n Ukame!", PREFIX, 160),
            "NDMA ALERT: Drought ALARM. Ukame!"
        );
        assert_eq!(
            sanitize_sms("ndma alert: Drought", PREFIX, 160),
            "NDMA ALERT: Drought"
        );
    }

    #[test]
    fn test_long_sms_truncated_on_char_boundary() {
        let long = format!("NDMA ALERT: {}", "Ukame mkali – maji mbali. ".repeat(20));
        let sms = sanitize_sms(&long, PREFIX, 160);
        assert!(sms.chars().count() <= 160);
        assert!(sms.starts_with(PREFIX));
        assert!(sms.ends_with('…'));
    }

    #[test]
    fn test_truncation_never_cuts_into_prefix() {
        let sms = sanitize_sms(&"y".repeat(40), "ALERT: ", 8);
        assert_eq!(sms, "ALERT: …");
        let sms = sanitize_sms("Drought worsening", "ALERT: ", 12);
        assert!(sms.starts_with("ALERT: "));
        assert!(sms.chars().count() <= 12);
    }

    #[test]
    fn test_finalize_normalizes_artifacts() {
        let raw = format!(
            "Here you go:\n```json\n{{\"sms_alert\": \"Drought {}\", \"governor_brief\": \"Your Excellency,\\n\\nThe county is in ALARM.\"}}\n```",
            "x".repeat(300)
        );
        let out = finalize(StageOutput::Text(raw), &AlertConfig::default());
        let artifacts = ActionArtifacts::from_stage_text(&out.into_text()).unwrap();
        assert!(artifacts.sms_alert.starts_with(PREFIX));
        assert!(artifacts.sms_alert.chars().count() <= 160);
        assert_eq!(artifacts.governor_brief, "Your Excellency, The county is in ALARM.");
    }

    #[test]
    fn test_finalize_passes_unparseable_and_errors_through() {
        let raw = StageOutput::Text("I cannot produce JSON today.".to_string());
        assert_eq!(finalize(raw.clone(), &AlertConfig::default()), raw);

        let failed: StageOutput = StageError::Generation {
            agent: "Responder".to_string(),
            cause: "boom".to_string(),
        }
        .into();
        assert_eq!(finalize(failed.clone(), &AlertConfig::default()), failed);

        let degraded = StageOutput::Degraded {
            text: "{\"drought_phase\": \"ALARM\"}".to_string(),
            error: StageError::Generation {
                agent: "Guardian".to_string(),
                cause: "HTTP 503".to_string(),
            },
        };
        assert_eq!(finalize(degraded.clone(), &AlertConfig::default()), degraded);
    }
}

//! Console rendering of a pipeline run
//!
//! Used by the `run` command. The Responder section shows the SMS and the
//! brief separately when its output parses as artifacts, raw text otherwise.

use std::fmt::Write;

use crate::types::{ActionArtifacts, PipelineResult};

const BANNER: &str = "============================================================";
const RULE: &str = "------------------------------------------------------------";

/// Render the three stage outputs as a human-readable report.
pub fn render_run_report(result: &PipelineResult) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "\n--- SENTINEL OUTPUT (Structured Data) ---");
    let _ = writeln!(out, "{}", result.sentinel_output);
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "\n--- GUARDIAN OUTPUT (Analysis) ---");
    let _ = writeln!(out, "{}", result.guardian_output);
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "\n--- RESPONDER OUTPUT (Action Artifacts) ---");
    match ActionArtifacts::from_stage_text(&result.responder_output) {
        Some(artifacts) => {
            let _ = writeln!(out, "\nSMS Alert:\n{}", artifacts.sms_alert);
            let _ = writeln!(out, "\nGovernor's Brief:\n{}", artifacts.governor_brief);
        }
        None => {
            let _ = writeln!(out, "{}", result.responder_output);
        }
    }
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "\n{BANNER}\nWORKFLOW COMPLETE.\n{BANNER}");
    out
}

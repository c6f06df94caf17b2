//! Locating a JSON object inside free-form model output.
//!
//! Models wrap JSON in markdown fences or surround it with prose. The
//! helpers here strip the fences and fall back to the outermost braces.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[allow(clippy::unwrap_used)]
fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?i)```(?:json)?").unwrap()
    })
}

/// Extract the first JSON object embedded in `text`.
///
/// Returns `None` when no parseable object is present; callers then keep
/// the raw text.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let cleaned = fence_regex().replace_all(text, "");
    let trimmed = cleaned.trim();

    if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(v @ Value::Object(_)) => Some(v),
        _ => None,
    }
}

//! Structured field metrics extracted by the Sentinel
//!
//! The Sentinel's output is model-generated text, usually JSON but with no
//! fixed key names. Parsing is therefore lenient: keys are matched by
//! keyword, numbers are pulled out of strings like `"12 km"`, and a
//! line-oriented fallback handles plain `VCI: 18.5` style output.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use super::extract_json_object;

/// The four indicators the Guardian classifies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructuredMetrics {
    /// Vegetation condition index (3-month)
    pub vci: f64,
    /// Distance pastoralists trek to water (km)
    pub water_distance_km: f64,
    /// Goat price at the local market
    pub goat_price: f64,
    /// Maize price per kg
    pub maize_price: f64,
}

/// Which indicator a key or line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Indicator {
    Vci,
    WaterDistance,
    GoatPrice,
    MaizePrice,
}

impl Indicator {
    const ALL: [Self; 4] = [Self::Vci, Self::WaterDistance, Self::GoatPrice, Self::MaizePrice];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Vci => &["vci", "vegetation"],
            Self::WaterDistance => &["water"],
            Self::GoatPrice => &["goat"],
            Self::MaizePrice => &["maize"],
        }
    }

    fn matches(self, lowercase_key: &str) -> bool {
        self.keywords().iter().any(|k| lowercase_key.contains(k))
    }
}

/// Key token prefixes describing a past value or a delta rather than the
/// current reading.
const HISTORICAL_MARKERS: &[&str] = &[
    "previous", "prior", "last", "change", "increase", "decrease", "delta", "diff", "drop",
    "rise", "pct", "percent",
];

/// Key tokens that name an indicator, its unit, or its current reading.
const PLAIN_TOKENS: &[&str] = &[
    "vci", "vegetation", "condition", "index", "water", "distance", "goat", "goats", "maize",
    "price", "prices", "market", "km", "kes", "ksh", "kg", "per", "value", "current", "latest",
];

fn key_tokens(path: &str) -> impl Iterator<Item = &str> {
    path.split(|c: char| !c.is_ascii_alphanumeric()).filter(|t| !t.is_empty())
}

fn is_historical(path: &str) -> bool {
    key_tokens(path).any(|t| HISTORICAL_MARKERS.iter().any(|m| t.starts_with(m)))
}

/// Ordering key for candidate paths, lower is more specific.
///
/// Historical keys rank last, then keys carrying qualifiers beyond the
/// indicator name, unit and `value`/`current`, then longer paths.
fn specificity(path: &str) -> (bool, usize, usize) {
    let qualifiers = key_tokens(path).filter(|t| !PLAIN_TOKENS.contains(t)).count();
    (is_historical(path), qualifiers, path.len())
}

#[allow(clippy::unwrap_used)]
fn number_regex() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| {
        Regex::new(r"-?\d+(?:\.\d+)?").unwrap()
    })
}

/// Leaf keys that annotate a value instead of holding one.
const ANNOTATION_KEYS: &[&str] = &["period", "unit", "units", "date", "source", "note", "notes", "currency"];

/// First number in `text`, ignoring thousands separators and ranges such
/// as `3-month`.
fn first_number(text: &str) -> Option<f64> {
    let without_commas = text.replace(',', "");
    number_regex()
        .find_iter(&without_commas)
        .find(|m| !without_commas[m.end()..].starts_with('-'))
        .and_then(|m| m.as_str().parse().ok())
}

fn is_annotation(path: &str) -> bool {
    let leaf = path.rsplit('.').next().unwrap_or(path);
    ANNOTATION_KEYS.contains(&leaf) || leaf.contains("ratio")
}

fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => first_number(s),
        _ => None,
    }
}

/// Flatten a JSON tree into `(dotted lowercase path, leaf)` pairs.
fn flatten<'a>(value: &'a Value, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let path = if prefix.is_empty() {
                    k.to_lowercase()
                } else {
                    format!("{prefix}.{}", k.to_lowercase())
                };
                flatten(v, &path, out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf)),
    }
}

#[derive(Default)]
struct Partial {
    vci: Option<f64>,
    water_distance_km: Option<f64>,
    goat_price: Option<f64>,
    maize_price: Option<f64>,
}

impl Partial {
    fn slot(&mut self, indicator: Indicator) -> &mut Option<f64> {
        match indicator {
            Indicator::Vci => &mut self.vci,
            Indicator::WaterDistance => &mut self.water_distance_km,
            Indicator::GoatPrice => &mut self.goat_price,
            Indicator::MaizePrice => &mut self.maize_price,
        }
    }

    fn fill(&mut self, indicator: Indicator, value: f64) {
        let slot = self.slot(indicator);
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn complete(self) -> Option<StructuredMetrics> {
        Some(StructuredMetrics {
            vci: self.vci?,
            water_distance_km: self.water_distance_km?,
            goat_price: self.goat_price?,
            maize_price: self.maize_price?,
        })
    }
}

impl StructuredMetrics {
    /// Parse the Sentinel's output text.
    ///
    /// Returns `None` if any of the four indicators cannot be found, which
    /// includes embedded error strings from a failed Sentinel stage.
    pub fn from_stage_text(text: &str) -> Option<Self> {
        if let Some(json) = extract_json_object(text) {
            if let Some(metrics) = Self::from_json(&json) {
                return Some(metrics);
            }
        }
        Self::from_lines(text)
    }

    fn from_json(json: &Value) -> Option<Self> {
        let mut leaves = Vec::new();
        flatten(json, "", &mut leaves);

        let mut best: [Option<((bool, usize, usize), f64)>; 4] = [None; 4];
        for (path, leaf) in &leaves {
            if is_annotation(path) {
                continue;
            }
            let Some(number) = value_as_number(leaf) else {
                continue;
            };
            let Some(slot) = Indicator::ALL.into_iter().position(|i| i.matches(path)) else {
                continue;
            };
            let rank = specificity(path);
            if best[slot].map_or(true, |(current, _)| rank < current) {
                best[slot] = Some((rank, number));
            }
        }

        let mut partial = Partial::default();
        for (indicator, candidate) in Indicator::ALL.into_iter().zip(best) {
            if let Some((_, number)) = candidate {
                partial.fill(indicator, number);
            }
        }
        partial.complete()
    }

    /// Line-oriented fallback: each clause naming an indicator contributes
    /// its first number.
    fn from_lines(text: &str) -> Option<Self> {
        let mut partial = Partial::default();
        let clauses = text
            .lines()
            .flat_map(|line| line.split(|c: char| c == ';' || c == '|'))
            .flat_map(|part| part.split(", "));
        for clause in clauses {
            let lower = clause.to_lowercase();
            let Some(indicator) = Indicator::ALL.into_iter().find(|i| i.matches(&lower)) else {
                continue;
            };
            if let Some(number) = first_number(&lower) {
                partial.fill(indicator, number);
            }
        }
        partial.complete()
    }
}

//! Guardian stage: NDMA threshold rules
//!
//! The drought phase and economic status always come from the rules below,
//! never from the model. The model only contributes the reasoning sentence.
//!
//! ## Drought phase
//! - ALARM: VCI < 20 or water distance > 10 km
//! - ALERT: 20 ≤ VCI ≤ 35
//! - NORMAL: VCI > 35
//!
//! ## Economic status (terms of trade = goat price / maize price)
//! - CRISIS: ToT < 30
//! - STRESSED: 30 ≤ ToT ≤ 50
//! - STABLE: ToT > 50

use tracing::{debug, warn};

use crate::config::{DroughtThresholds, EconomyThresholds, ThresholdConfig};
use crate::types::{
    extract_json_object, Analysis, ClassificationError, DroughtPhase, EconomicStatus, StageError,
    StageOutput, StructuredMetrics,
};

/// Drought phase from vegetation condition and water distance.
pub fn classify_drought(vci: f64, water_distance_km: f64, t: &DroughtThresholds) -> DroughtPhase {
    if vci < t.alarm_vci_below || water_distance_km > t.alarm_water_distance_km_above {
        DroughtPhase::Alarm
    } else if vci <= t.alert_vci_max {
        DroughtPhase::Alert
    } else {
        DroughtPhase::Normal
    }
}

/// Goats-for-maize terms of trade.
pub fn terms_of_trade(goat_price: f64, maize_price: f64) -> Result<f64, ClassificationError> {
    if !goat_price.is_finite() {
        return Err(ClassificationError::NonFinite {
            field: "goat_price",
            value: goat_price,
        });
    }
    if !maize_price.is_finite() {
        return Err(ClassificationError::NonFinite {
            field: "maize_price",
            value: maize_price,
        });
    }
    if maize_price <= 0.0 {
        return Err(ClassificationError::NonPositiveMaizePrice(maize_price));
    }
    Ok(goat_price / maize_price)
}

/// Economic status from terms of trade.
pub fn classify_economy(terms_of_trade: f64, t: &EconomyThresholds) -> EconomicStatus {
    if terms_of_trade < t.crisis_tot_below {
        EconomicStatus::Crisis
    } else if terms_of_trade <= t.stressed_tot_max {
        EconomicStatus::Stressed
    } else {
        EconomicStatus::Stable
    }
}

/// Rule-based classification of one set of metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub metrics: StructuredMetrics,
    pub drought_phase: DroughtPhase,
    pub economic_status: EconomicStatus,
    pub terms_of_trade: f64,
}

impl Classification {
    /// One-sentence explanation used when the model offers none.
    pub fn justification(&self, t: &ThresholdConfig) -> String {
        let m = &self.metrics;
        let phase_reason = match self.drought_phase {
            DroughtPhase::Alarm if m.vci < t.drought.alarm_vci_below => format!(
                "VCI {:.1} is below {}",
                m.vci, t.drought.alarm_vci_below
            ),
            DroughtPhase::Alarm => format!(
                "water distance {:.1} km exceeds {} km",
                m.water_distance_km, t.drought.alarm_water_distance_km_above
            ),
            DroughtPhase::Alert => format!(
                "VCI {:.1} is within {}-{}",
                m.vci, t.drought.alarm_vci_below, t.drought.alert_vci_max
            ),
            DroughtPhase::Normal => format!("VCI {:.1} is above {}", m.vci, t.drought.alert_vci_max),
        };
        format!(
            "Drought phase is {} because {}; terms of trade {:.1} (goat {:.0} / maize {:.0}) indicate {} household economics.",
            self.drought_phase,
            phase_reason,
            self.terms_of_trade,
            m.goat_price,
            m.maize_price,
            self.economic_status
        )
    }
}

/// Apply the threshold rules to `metrics`.
pub fn analyze(
    metrics: &StructuredMetrics,
    t: &ThresholdConfig,
) -> Result<Classification, ClassificationError> {
    for (field, value) in [("vci", metrics.vci), ("water_distance_km", metrics.water_distance_km)] {
        if !value.is_finite() {
            return Err(ClassificationError::NonFinite { field, value });
        }
    }
    let tot = terms_of_trade(metrics.goat_price, metrics.maize_price)?;
    Ok(Classification {
        metrics: *metrics,
        drought_phase: classify_drought(metrics.vci, metrics.water_distance_km, &t.drought),
        economic_status: classify_economy(tot, &t.economy),
        terms_of_trade: tot,
    })
}

/// Reasoning offered by the model, if any.
fn model_reasoning(text: &str, classification: &Classification) -> Option<String> {
    if let Some(json) = extract_json_object(text) {
        if let Some(model) = Analysis::from_stage_text(text) {
            if model.drought_phase != classification.drought_phase
                || model.economic_status != classification.economic_status
            {
                warn!(
                    model_phase = %model.drought_phase,
                    model_status = %model.economic_status,
                    phase = %classification.drought_phase,
                    status = %classification.economic_status,
                    "Model classification disagrees with threshold rules; keeping rules"
                );
            }
        }
        return json
            .get("reasoning")
            .and_then(|r| r.as_str())
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
    }

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Turn the Guardian agent's output into the stage result.
///
/// Metrics are read from `sentinel_text`, the same text the agent was given.
/// If they cannot be read the agent output is returned untouched. A failed
/// backend call with readable metrics yields a `Degraded` output: the
/// rule-based analysis with the error in its `backend_error` field.
pub fn finalize(sentinel_text: &str, agent_output: StageOutput, t: &ThresholdConfig) -> StageOutput {
    let Some(metrics) = StructuredMetrics::from_stage_text(sentinel_text) else {
        debug!("No structured metrics in Sentinel output; passing Guardian output through");
        return agent_output;
    };

    let classification = match analyze(&metrics, t) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Guardian classification failed");
            return StageError::Classification(e).into();
        }
    };

    let analysis = |reasoning, backend_error| Analysis {
        drought_phase: classification.drought_phase,
        economic_status: classification.economic_status,
        reasoning,
        backend_error,
    };

    match agent_output {
        StageOutput::Text(text) => {
            let reasoning = model_reasoning(&text, &classification)
                .unwrap_or_else(|| classification.justification(t));
            StageOutput::Text(analysis(reasoning, None).to_stage_text())
        }
        StageOutput::Failed(error) | StageOutput::Degraded { error, .. } => {
            warn!(error = %error, "Guardian backend failed; reporting rule-based analysis");
            let text = analysis(classification.justification(t), Some(error.to_string())).to_stage_text();
            StageOutput::Degraded { text, error }
        }
    }
}

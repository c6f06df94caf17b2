//! Guardian Configuration - Pipeline settings as operator-tunable TOML values
//!
//! Every threshold and model list the pipeline relies on is a field in this
//! module. Each struct implements `Default` with the NDMA values, so a
//! deployment without a config file behaves exactly like the reference setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::llm::CapabilityPreferences;
use crate::types::Stage;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ASAL_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "asal_guardian.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a pipeline deployment.
///
/// Load with `GuardianConfig::load()` which searches:
/// 1. `$ASAL_CONFIG` env var
/// 2. `./asal_guardian.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardianConfig {
    /// Generation backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Capability preference lists, one per stage
    #[serde(default)]
    pub models: ModelPreferencesConfig,

    /// NDMA classification thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// SMS alert policy
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Stage sequencing behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl GuardianConfig {
    /// Load configuration using the standard search order.
    ///
    /// A config file that exists but cannot be read, parsed or validated is
    /// an error; the caller treats it as fatal at startup.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            let config = Self::load_from_file(&p)?;
            info!(path = %p.display(), "Loaded guardian config from {}", CONFIG_ENV_VAR);
            return Ok(config);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            let config = Self::load_from_file(&local)?;
            info!("Loaded guardian config from ./{}", LOCAL_CONFIG_FILE);
            return Ok(config);
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings only.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject values that cannot produce a working pipeline.
    ///
    /// All problems are collected so the operator sees them in one pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        for stage in Stage::ALL {
            if self.models.for_stage(stage).is_none() {
                errors.push(format!(
                    "models.{} must list at least one non-empty capability id",
                    stage.config_key()
                ));
            }
        }

        let d = &self.thresholds.drought;
        if !(d.alarm_vci_below.is_finite() && d.alert_vci_max.is_finite()) {
            errors.push("thresholds.drought VCI bounds must be finite".to_string());
        } else if d.alarm_vci_below > d.alert_vci_max {
            errors.push(format!(
                "thresholds.drought.alarm_vci_below ({:.1}) must not exceed alert_vci_max ({:.1})",
                d.alarm_vci_below, d.alert_vci_max
            ));
        }
        if !d.alarm_water_distance_km_above.is_finite() || d.alarm_water_distance_km_above < 0.0 {
            errors.push(format!(
                "thresholds.drought.alarm_water_distance_km_above ({}) must be a non-negative distance",
                d.alarm_water_distance_km_above
            ));
        }

        let e = &self.thresholds.economy;
        if !(e.crisis_tot_below.is_finite() && e.stressed_tot_max.is_finite()) {
            errors.push("thresholds.economy bounds must be finite".to_string());
        } else if e.crisis_tot_below > e.stressed_tot_max {
            errors.push(format!(
                "thresholds.economy.crisis_tot_below ({:.1}) must not exceed stressed_tot_max ({:.1})",
                e.crisis_tot_below, e.stressed_tot_max
            ));
        }

        let a = &self.alerts;
        if a.sms_prefix.trim().is_empty() {
            errors.push("alerts.sms_prefix must not be empty".to_string());
        } else if a.sms_prefix.trim() != a.sms_prefix {
            errors.push(format!(
                "alerts.sms_prefix '{}' must not start or end with whitespace",
                a.sms_prefix
            ));
        }
        // Room for the prefix, a space and at least a few characters of text
        if a.sms_prefix.chars().count() + 2 > a.sms_max_chars {
            errors.push(format!(
                "alerts.sms_max_chars ({}) leaves no room after the prefix '{}'",
                a.sms_max_chars, a.sms_prefix
            ));
        }

        let b = &self.backend;
        if b.request_timeout_secs == 0 {
            errors.push("backend.request_timeout_secs must be greater than zero".to_string());
        }
        if b.discovery_timeout_secs == 0 {
            errors.push("backend.discovery_timeout_secs must be greater than zero".to_string());
        }
        if !b.base_url.starts_with("http://") && !b.base_url.starts_with("https://") {
            errors.push(format!(
                "backend.base_url '{}' must start with http:// or https://",
                b.base_url
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Backend
// ============================================================================

/// Generation backend connection settings.
///
/// The API credential is deliberately not part of this struct; it is read
/// from the environment once at startup and passed to the backend directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call generation timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Capability discovery timeout (seconds)
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

fn default_base_url() -> String {
    defaults::BACKEND_BASE_URL.to_string()
}

const fn default_request_timeout() -> u64 {
    defaults::GENERATION_TIMEOUT_SECS
}

const fn default_discovery_timeout() -> u64 {
    defaults::DISCOVERY_TIMEOUT_SECS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            discovery_timeout_secs: default_discovery_timeout(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl BackendConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}

// ============================================================================
// Model Preferences
// ============================================================================

/// Ordered capability ids per stage, most preferred first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPreferencesConfig {
    #[serde(default = "default_sentinel_models")]
    pub sentinel: Vec<String>,
    #[serde(default = "default_guardian_models")]
    pub guardian: Vec<String>,
    #[serde(default = "default_responder_models")]
    pub responder: Vec<String>,
}

fn to_owned_list(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_string()).collect()
}

fn default_sentinel_models() -> Vec<String> {
    to_owned_list(defaults::SENTINEL_MODELS)
}

fn default_guardian_models() -> Vec<String> {
    to_owned_list(defaults::GUARDIAN_MODELS)
}

fn default_responder_models() -> Vec<String> {
    to_owned_list(defaults::RESPONDER_MODELS)
}

impl Default for ModelPreferencesConfig {
    fn default() -> Self {
        Self {
            sentinel: default_sentinel_models(),
            guardian: default_guardian_models(),
            responder: default_responder_models(),
        }
    }
}

impl ModelPreferencesConfig {
    /// Preference list for a stage, or `None` if it is empty.
    pub fn for_stage(&self, stage: Stage) -> Option<CapabilityPreferences> {
        let ids = match stage {
            Stage::Sentinel => &self.sentinel,
            Stage::Guardian => &self.guardian,
            Stage::Responder => &self.responder,
        };
        CapabilityPreferences::new(ids.clone())
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// NDMA classification thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub drought: DroughtThresholds,
    #[serde(default)]
    pub economy: EconomyThresholds,
}

/// Drought phase bands.
///
/// ALARM if `vci < alarm_vci_below` or `water_distance_km > alarm_water_distance_km_above`;
/// ALERT if `alarm_vci_below <= vci <= alert_vci_max`; NORMAL otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DroughtThresholds {
    #[serde(default = "default_alarm_vci")]
    pub alarm_vci_below: f64,
    #[serde(default = "default_alarm_water")]
    pub alarm_water_distance_km_above: f64,
    #[serde(default = "default_alert_vci_max")]
    pub alert_vci_max: f64,
}

const fn default_alarm_vci() -> f64 {
    defaults::ALARM_VCI_BELOW
}

const fn default_alarm_water() -> f64 {
    defaults::ALARM_WATER_DISTANCE_KM_ABOVE
}

const fn default_alert_vci_max() -> f64 {
    defaults::ALERT_VCI_MAX
}

impl Default for DroughtThresholds {
    fn default() -> Self {
        Self {
            alarm_vci_below: default_alarm_vci(),
            alarm_water_distance_km_above: default_alarm_water(),
            alert_vci_max: default_alert_vci_max(),
        }
    }
}

/// Terms-of-trade bands.
///
/// CRISIS if `tot < crisis_tot_below`; STRESSED up to and including
/// `stressed_tot_max`; STABLE above.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EconomyThresholds {
    #[serde(default = "default_crisis_tot")]
    pub crisis_tot_below: f64,
    #[serde(default = "default_stressed_tot_max")]
    pub stressed_tot_max: f64,
}

const fn default_crisis_tot() -> f64 {
    defaults::CRISIS_TOT_BELOW
}

const fn default_stressed_tot_max() -> f64 {
    defaults::STRESSED_TOT_MAX
}

impl Default for EconomyThresholds {
    fn default() -> Self {
        Self {
            crisis_tot_below: default_crisis_tot(),
            stressed_tot_max: default_stressed_tot_max(),
        }
    }
}

// ============================================================================
// Alerts
// ============================================================================

/// SMS transport constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_sms_prefix")]
    pub sms_prefix: String,
    #[serde(default = "default_sms_max_chars")]
    pub sms_max_chars: usize,
}

fn default_sms_prefix() -> String {
    defaults::SMS_PREFIX.to_string()
}

const fn default_sms_max_chars() -> usize {
    defaults::SMS_MAX_CHARS
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sms_prefix: default_sms_prefix(),
            sms_max_chars: default_sms_max_chars(),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Stage sequencing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause before each agent invocation (milliseconds)
    #[serde(default = "default_pacing_delay")]
    pub pacing_delay_ms: u64,

    /// Stop invoking later stages once a stage produced an error.
    ///
    /// Off by default: error text is forwarded as the next stage's input.
    #[serde(default)]
    pub halt_on_stage_error: bool,
}

const fn default_pacing_delay() -> u64 {
    defaults::PACING_DELAY_MS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pacing_delay_ms: default_pacing_delay(),
            halt_on_stage_error: false,
        }
    }
}

impl PipelineConfig {
    pub const fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `ASAL_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

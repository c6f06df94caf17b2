//! System-wide default constants.
//!
//! Centralises the values the built-in `GuardianConfig` falls back to.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Generation Backend
// ============================================================================

/// Base URL of the Google Generative Language REST API.
pub const BACKEND_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Maximum time to wait for a single generation call before giving up (seconds).
pub const GENERATION_TIMEOUT_SECS: u64 = 120;

/// Maximum time to wait for capability discovery (seconds).
///
/// Discovery failure is non-fatal, so this is kept short.
pub const DISCOVERY_TIMEOUT_SECS: u64 = 15;

/// Page size requested when listing models.
pub const DISCOVERY_PAGE_SIZE: u32 = 1000;

/// Generation method a model must advertise to be considered usable.
pub const GENERATE_CONTENT_METHOD: &str = "generateContent";

// ============================================================================
// Capability Preferences
// ============================================================================

/// Sentinel favours the cheaper, faster family.
pub const SENTINEL_MODELS: &[&str] = &[
    "models/gemini-2.5-flash",
    "models/gemini-1.5-flash",
    "models/gemini-1.5-pro",
];

/// Guardian favours the higher-quality family.
pub const GUARDIAN_MODELS: &[&str] = &[
    "models/gemini-2.5-pro",
    "models/gemini-1.5-pro",
    "models/gemini-1.5-flash",
];

/// Responder favours the higher-quality family.
pub const RESPONDER_MODELS: &[&str] = &[
    "models/gemini-2.5-pro",
    "models/gemini-1.5-pro",
    "models/gemini-1.5-flash",
];

// ============================================================================
// NDMA Thresholds
// ============================================================================

/// VCI strictly below this triggers ALARM.
pub const ALARM_VCI_BELOW: f64 = 20.0;

/// Water distance strictly above this (km) triggers ALARM.
pub const ALARM_WATER_DISTANCE_KM_ABOVE: f64 = 10.0;

/// Upper bound (inclusive) of the ALERT VCI band.
pub const ALERT_VCI_MAX: f64 = 35.0;

/// Terms of trade strictly below this is CRISIS.
pub const CRISIS_TOT_BELOW: f64 = 30.0;

/// Upper bound (inclusive) of the STRESSED terms-of-trade band.
pub const STRESSED_TOT_MAX: f64 = 50.0;

// ============================================================================
// Alerts
// ============================================================================

/// Literal every SMS alert must start with.
pub const SMS_PREFIX: &str = "NDMA ALERT:";

/// Hard limit of a single SMS segment (characters).
pub const SMS_MAX_CHARS: usize = 160;

// ============================================================================
// Pipeline
// ============================================================================

/// Pause before each agent invocation (milliseconds). Zero disables it.
pub const PACING_DELAY_MS: u64 = 0;

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Service name reported by the liveness probe.
pub const SERVICE_NAME: &str = "ASAL-Guardian";

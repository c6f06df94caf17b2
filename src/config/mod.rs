//! Guardian Configuration Module
//!
//! Provides the pipeline configuration loaded from TOML files: capability
//! preferences per stage, NDMA classification thresholds, alert policy,
//! backend timeouts and server settings.
//!
//! ## Loading Order
//!
//! 1. `ASAL_CONFIG` environment variable (path to TOML file)
//! 2. `asal_guardian.toml` in the current working directory
//! 3. Built-in defaults (the NDMA thresholds and model lists)
//!
//! ## Usage
//!
//! The configuration is loaded once in `main()` and handed to the
//! orchestrator explicitly:
//!
//! ```ignore
//! let config = Arc::new(GuardianConfig::load()?);
//! let orchestrator = Orchestrator::new(config, backend, source)?;
//! ```

mod guardian_config;
pub mod defaults;
pub mod validation;

pub use guardian_config::*;

//! Capability selection with graceful fallback
//!
//! Resolution order for one stage:
//! 1. Discovery fails → first preferred id (startup never blocks on discovery)
//! 2. First preferred id that is available
//! 3. No preferred id available → first available id, with a warning
//! 4. Nothing available at all → first preferred id, with a warning

use std::time::Duration;
use tracing::{debug, warn};

use super::{BackendError, GenerationBackend};

/// Ordered capability ids, most preferred first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityPreferences(Vec<String>);

impl CapabilityPreferences {
    /// Build a preference list, dropping blank ids.
    ///
    /// Returns `None` if nothing usable remains.
    pub fn new(ids: Vec<String>) -> Option<Self> {
        let ids: Vec<String> = ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            None
        } else {
            Some(Self(ids))
        }
    }

    /// Most preferred id.
    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Outcome of resolving a preference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A preferred id was available
    Preferred(String),
    /// No preferred id was available; an arbitrary available id was chosen
    FallbackAvailable(String),
    /// Discovery failed; the primary preference is used unverified
    DiscoveryFailed(String),
    /// Discovery succeeded but reported nothing usable
    NoneAvailable(String),
}

impl Selection {
    /// Resolve `preferred` against the result of capability discovery.
    pub fn resolve(
        preferred: &CapabilityPreferences,
        discovered: Result<&[String], &BackendError>,
    ) -> Self {
        let available = match discovered {
            Ok(available) => available,
            Err(_) => return Self::DiscoveryFailed(preferred.primary().to_string()),
        };

        if let Some(id) = preferred.iter().find(|p| available.iter().any(|a| a == p)) {
            return Self::Preferred(id.to_string());
        }

        match available.iter().find(|a| !a.trim().is_empty()) {
            Some(first) => Self::FallbackAvailable(first.clone()),
            None => Self::NoneAvailable(preferred.primary().to_string()),
        }
    }

    pub fn capability(&self) -> &str {
        match self {
            Self::Preferred(id)
            | Self::FallbackAvailable(id)
            | Self::DiscoveryFailed(id)
            | Self::NoneAvailable(id) => id,
        }
    }

    pub fn into_capability(self) -> String {
        match self {
            Self::Preferred(id)
            | Self::FallbackAvailable(id)
            | Self::DiscoveryFailed(id)
            | Self::NoneAvailable(id) => id,
        }
    }
}

/// Resolves preference lists against a backend's live capability set.
pub struct ModelSelector<'a> {
    backend: &'a dyn GenerationBackend,
    timeout: Duration,
}

impl<'a> ModelSelector<'a> {
    pub fn new(backend: &'a dyn GenerationBackend, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Pick one capability id for `preferred`. Never fails.
    ///
    /// Discovery runs under the configured timeout; a hang is treated the
    /// same as a discovery error.
    pub async fn select(&self, preferred: &CapabilityPreferences) -> String {
        let discovery = self.backend.discover_capabilities();
        let discovered = match tokio::time::timeout(self.timeout, discovery).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::TimedOut {
                operation: "capability discovery",
                secs: self.timeout.as_secs_f64(),
            }),
        };

        let selection = Selection::resolve(preferred, discovered.as_deref());
        match (&selection, &discovered) {
            (Selection::Preferred(id), _) => {
                debug!(capability = %id, "Preferred capability available");
            }
            (Selection::FallbackAvailable(id), _) => {
                warn!(
                    capability = %id,
                    preferred = %preferred.primary(),
                    "Preferred models not found, using fallback"
                );
            }
            (Selection::DiscoveryFailed(id), Err(e)) => {
                warn!(capability = %id, error = %e, "Could not list models, using first preferred");
            }
            (Selection::DiscoveryFailed(id), Ok(_)) | (Selection::NoneAvailable(id), _) => {
                warn!(capability = %id, "No available models found, using first preferred");
            }
        }
        selection.into_capability()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(ids: &[&str]) -> CapabilityPreferences {
        CapabilityPreferences::new(ids.iter().map(|s| (*s).to_string()).collect()).unwrap()
    }

    fn owned(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_blank_preferences_rejected() {
        assert!(CapabilityPreferences::new(vec![]).is_none());
        assert!(CapabilityPreferences::new(vec!["  ".to_string()]).is_none());
        assert_eq!(prefs(&[" a ", "", "b"]).iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_first_available_preference_wins() {
        let available = owned(&["models/c", "models/b", "models/a"]);
        let selection = Selection::resolve(&prefs(&["models/x", "models/b", "models/a"]), Ok(&available));
        assert_eq!(selection, Selection::Preferred("models/b".to_string()));
    }

    #[test]
    fn test_fallback_to_available_not_primary() {
        let available = owned(&["models/other"]);
        let selection = Selection::resolve(&prefs(&["models/x", "models/y"]), Ok(&available));
        assert_eq!(selection, Selection::FallbackAvailable("models/other".to_string()));
    }

    #[test]
    fn test_discovery_failure_uses_primary() {
        let err = BackendError::Status {
            status: 403,
            message: "denied".to_string(),
        };
        let selection = Selection::resolve(&prefs(&["models/x", "models/y"]), Err(&err));
        assert_eq!(selection.capability(), "models/x");
        assert!(matches!(selection, Selection::DiscoveryFailed(_)));
    }

    #[test]
    fn test_discovery_timeout_keeps_fractional_seconds() {
        let err = BackendError::TimedOut {
            operation: "capability discovery",
            secs: Duration::from_millis(250).as_secs_f64(),
        };
        assert_eq!(err.to_string(), "capability discovery timed out after 0.25s");
    }

    #[test]
    fn test_empty_discovery_uses_primary() {
        let selection = Selection::resolve(&prefs(&["models/x"]), Ok(&[]));
        assert_eq!(selection, Selection::NoneAvailable("models/x".to_string()));
    }

    #[test]
    fn test_result_never_empty_across_cases() {
        let preferred = prefs(&["p1", "p2"]);
        let err = BackendError::Malformed("boom".to_string());
        let cases: Vec<Result<Vec<String>, &BackendError>> = vec![
            Ok(vec![]),
            Ok(owned(&["p2"])),
            Ok(owned(&["q"])),
            Ok(owned(&["", "q"])),
            Err(&err),
        ];
        for case in cases {
            let selection = match &case {
                Ok(v) => Selection::resolve(&preferred, Ok(v.as_slice())),
                Err(e) => Selection::resolve(&preferred, Err(*e)),
            };
            assert!(!selection.capability().is_empty());
            if let Ok(available) = &case {
                let in_preferred = preferred.iter().any(|p| p == selection.capability());
                let in_available = available.iter().any(|a| a == selection.capability());
                assert!(in_preferred || in_available);
            }
        }
    }
}

//! Runtime configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::Runtime`] and the realm it hosts.
///
/// # Examples
///
/// ```
/// use promise_runtime::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{ "microtask_limit": 500 }"#).unwrap();
/// assert_eq!(config.microtask_limit, 500);
/// assert!(config.track_rejections);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Watch rejections and report the unhandled ones
    pub track_rejections: bool,
    /// Log a warning for an unhandled rejection nobody listens for
    pub warn_on_unhandled: bool,
    /// Microtasks allowed per drain before the loop fails; 0, the default,
    /// means unlimited
    pub microtask_limit: usize,
}

impl RuntimeConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            track_rejections: true,
            warn_on_unhandled: true,
            microtask_limit: 0,
        }
    }

    /// Parses a JSON configuration; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enable or disable rejection tracking
    pub fn with_track_rejections(mut self, enabled: bool) -> Self {
        self.track_rejections = enabled;
        self
    }

    /// Enable or disable the unhandled-rejection warning
    pub fn with_warn_on_unhandled(mut self, enabled: bool) -> Self {
        self.warn_on_unhandled = enabled;
        self
    }

    /// Caps the microtasks of one drain, turning a runaway chain into an
    /// error
    pub fn with_microtask_limit(mut self, limit: usize) -> Self {
        self.microtask_limit = limit;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Drift scoring policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// EWMA smoothing factor α in (0, 1]. Higher reacts faster.
    pub smoothing: f64,
    /// Cumulative drift above this value revokes the intent.
    pub threshold: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.3,
            threshold: 0.7,
        }
    }
}

/// Configuration for a [`crate::ValidationEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Drift scoring policy.
    pub drift: DriftConfig,
    /// Denied calls after which `drift_report` flags repeated denials.
    /// Calls on an intent that is no longer active are counted.
    pub repeated_violation_limit: u32,
    /// Maximum in-memory history entries; `None` keeps everything.
    pub history_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drift: DriftConfig::default(),
            repeated_violation_limit: 3,
            history_capacity: None,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<()> {
        let alpha = self.drift.smoothing;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "drift.smoothing must be in (0, 1], got {alpha}"
            )));
        }
        let threshold = self.drift.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "drift.threshold must be in [0, 1], got {threshold}"
            )));
        }
        if self.repeated_violation_limit == 0 {
            return Err(EngineError::InvalidConfig(
                "repeated_violation_limit must be at least 1".into(),
            ));
        }
        if self.history_capacity == Some(0) {
            return Err(EngineError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

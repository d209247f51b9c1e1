//! Behavioral drift between declared purpose and observed actions.
//!
//! Each action's semantic distance from the declared purpose is folded into
//! an exponentially weighted moving average:
//!
//! ```text
//! cumulative = α·d + (1 − α)·prior
//! ```
//!
//! Recent actions dominate, and a single outlier decays over following
//! in-purpose actions. The intent is vetoed once `cumulative` is strictly
//! greater than the threshold.

use serde::{Deserialize, Serialize};

use crate::action::ActionRecord;
use crate::config::DriftConfig;

/// Semantic distance between a declared purpose and an action description.
///
/// Implementations return a value in `[0, 1]`, where 0 means the action is
/// fully aligned. The engine clamps anything outside that range and treats
/// NaN as 1.
pub trait PurposeDistance: Send + Sync {
    fn distance(&self, purpose: &str, action_description: &str) -> f64;
}

impl<F> PurposeDistance for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn distance(&self, purpose: &str, action_description: &str) -> f64 {
        self(purpose, action_description)
    }
}

/// Distance function that never reports drift.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDrift;

impl PurposeDistance for NoDrift {
    fn distance(&self, _purpose: &str, _action_description: &str) -> f64 {
        0.0
    }
}

/// Bring a raw distance into `[0, 1]`.
pub fn normalize_distance(raw: f64) -> f64 {
    if raw.is_nan() {
        1.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// Drift contribution of one action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftScore {
    /// Normalized distance of the action.
    pub distance: f64,
    /// `α·distance`.
    pub delta: f64,
    /// Updated moving average.
    pub cumulative: f64,
}

/// EWMA drift scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftDetector {
    smoothing: f64,
    threshold: f64,
}

impl DriftDetector {
    pub fn new(config: &DriftConfig) -> Self {
        Self {
            smoothing: config.smoothing,
            threshold: config.threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fold a raw distance into the prior cumulative score.
    pub fn score(&self, distance: f64, prior: f64) -> DriftScore {
        let distance = normalize_distance(distance);
        let delta = self.smoothing * distance;
        DriftScore {
            distance,
            delta,
            cumulative: delta + (1.0 - self.smoothing) * prior,
        }
    }

    /// Score an action against the declared purpose.
    pub fn measure(
        &self,
        distance_fn: &dyn PurposeDistance,
        declared_purpose: &str,
        action: &ActionRecord,
        prior: f64,
    ) -> DriftScore {
        let raw = distance_fn.distance(declared_purpose, &action.description());
        self.score(raw, prior)
    }

    /// Whether `cumulative` is past the threshold.
    pub fn exceeds(&self, cumulative: f64) -> bool {
        cumulative > self.threshold
    }
}

/// Why drift was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriftSignal {
    /// Cumulative drift is above the threshold.
    ThresholdExceeded,
    /// Denied calls reached the configured limit.
    ///
    /// Calls made after revocation count too: an agent that keeps acting on
    /// a revoked intent is itself a drift signal.
    RepeatedDenials { count: u64 },
}

/// Summary returned by `drift_report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub drift_detected: bool,
    pub cumulative_drift: f64,
    pub threshold: f64,
    pub signal: Option<DriftSignal>,
    pub reason: Option<String>,
}

impl DriftReport {
    /// Build a report from the current score and denial count.
    pub fn assess(
        detector: &DriftDetector,
        cumulative_drift: f64,
        denied: u64,
        repeated_violation_limit: u32,
    ) -> Self {
        let signal = if detector.exceeds(cumulative_drift) {
            Some(DriftSignal::ThresholdExceeded)
        } else if denied >= u64::from(repeated_violation_limit) {
            Some(DriftSignal::RepeatedDenials { count: denied })
        } else {
            None
        };
        let reason = signal.as_ref().map(|signal| match signal {
            DriftSignal::ThresholdExceeded => format!(
                "Cumulative drift {:.3} exceeds threshold {:.3}",
                cumulative_drift,
                detector.threshold()
            ),
            DriftSignal::RepeatedDenials { count } => {
                format!("Repeated violations detected ({count} denied actions)")
            }
        });
        Self {
            drift_detected: signal.is_some(),
            cumulative_drift,
            threshold: detector.threshold(),
            signal,
            reason,
        }
    }
}

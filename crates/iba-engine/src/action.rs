//! Action requests, recorded actions, and validation outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use iba_core::IntentStatus;

/// Reason string carried by every allowed result.
pub const ALLOWED_REASON: &str = "action aligns with declared intent";

/// An agent's proposed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Kind of action, e.g. `read` or `transfer`.
    pub action_type: String,
    /// Concrete `:`-delimited resource the action touches.
    pub resource: String,
    /// Quantity charged against matching resource limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Free-form parameters, used only for drift scoring.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ActionRequest {
    pub fn new(action_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            resource: resource.into(),
            amount: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Set the amount charged against limits.
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Add a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// A request once the engine has assigned it a sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Monotonic per-engine number, starting at 1.
    pub sequence_no: u64,
    pub action_type: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Evaluation time (Unix milliseconds).
    pub timestamp: i64,
}

impl ActionRecord {
    pub fn new(sequence_no: u64, request: ActionRequest, timestamp: i64) -> Self {
        Self {
            sequence_no,
            action_type: request.action_type,
            resource: request.resource,
            amount: request.amount,
            parameters: request.parameters,
            timestamp,
        }
    }

    /// Text handed to the purpose distance function.
    ///
    /// `"<action_type> <resource>"`, then ` amount=<n>` if present, then
    /// ` key=value` for each parameter in key order.
    pub fn description(&self) -> String {
        let mut text = format!("{} {}", self.action_type, self.resource);
        if let Some(amount) = self.amount {
            text.push_str(&format!(" amount={amount}"));
        }
        for (key, value) in &self.parameters {
            text.push_str(&format!(" {key}={value}"));
        }
        text
    }
}

/// Why an action was denied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    /// Amount was negative or not a finite number.
    InvalidAmount { amount: f64 },
    /// Resource matched a forbidden pattern.
    ForbiddenResource { resource: String, pattern: String },
    /// No allowed pattern matched the resource.
    NotInScope { resource: String },
    /// Charging the amount would take a limit over its cap.
    LimitExceeded {
        key: String,
        used: f64,
        requested: f64,
        limit: f64,
    },
    /// `max_actions` allowed actions were already taken.
    ActionLimitExceeded { limit: u64 },
    /// Cumulative drift crossed the threshold.
    DriftThresholdExceeded { cumulative: f64, threshold: f64 },
    /// The intent had already reached a terminal state.
    IntentNotActive { status: IntentStatus },
    /// The guard gave up waiting on the engine.
    TimedOut { after_ms: u64 },
    /// The guard could not obtain a result.
    Internal { message: String },
}

impl DenialReason {
    /// Whether this denial counts as a scope or drift violation.
    ///
    /// Violations revoke the intent; the other denials leave state alone.
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            DenialReason::InvalidAmount { .. }
                | DenialReason::ForbiddenResource { .. }
                | DenialReason::NotInScope { .. }
                | DenialReason::LimitExceeded { .. }
                | DenialReason::ActionLimitExceeded { .. }
                | DenialReason::DriftThresholdExceeded { .. }
        )
    }

    /// Stable short name, for logs and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::InvalidAmount { .. } => "invalid_amount",
            DenialReason::ForbiddenResource { .. } => "forbidden",
            DenialReason::NotInScope { .. } => "not_in_scope",
            DenialReason::LimitExceeded { .. } => "limit_exceeded",
            DenialReason::ActionLimitExceeded { .. } => "action_limit_exceeded",
            DenialReason::DriftThresholdExceeded { .. } => "drift",
            DenialReason::IntentNotActive { .. } => "not_active",
            DenialReason::TimedOut { .. } => "timed_out",
            DenialReason::Internal { .. } => "internal",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::InvalidAmount { amount } => {
                write!(f, "invalid amount {amount}: must be finite and non-negative")
            }
            DenialReason::ForbiddenResource { resource, pattern } => {
                write!(f, "explicitly forbidden: {resource} matches {pattern}")
            }
            DenialReason::NotInScope { resource } => {
                write!(f, "not in allowed scope: {resource}")
            }
            DenialReason::LimitExceeded {
                key,
                used,
                requested,
                limit,
            } => write!(
                f,
                "exceeds resource limit {key}: {used} used + {requested} requested > {limit}"
            ),
            DenialReason::ActionLimitExceeded { limit } => {
                write!(f, "action limit exceeded: at most {limit} actions")
            }
            DenialReason::DriftThresholdExceeded {
                cumulative,
                threshold,
            } => write!(
                f,
                "intent drift exceeded: {cumulative:.3} > {threshold:.3}"
            ),
            DenialReason::IntentNotActive { status } => write!(f, "intent not active ({status})"),
            DenialReason::TimedOut { after_ms } => {
                write!(f, "validation timed out after {after_ms}ms")
            }
            DenialReason::Internal { message } => write!(f, "validation failed: {message}"),
        }
    }
}

/// Outcome of one `validate_action` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub allowed: bool,
    /// Human-readable explanation.
    pub reason: String,
    /// Structured cause; `None` iff `allowed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
    /// Change in cumulative drift contributed by this action.
    pub drift_delta: f64,
    /// Cumulative drift after this action.
    pub cumulative_drift: f64,
}

impl ValidationResult {
    pub fn allowed(drift_delta: f64, cumulative_drift: f64) -> Self {
        Self {
            allowed: true,
            reason: ALLOWED_REASON.to_string(),
            denial: None,
            drift_delta,
            cumulative_drift,
        }
    }

    pub fn denied(denial: DenialReason, drift_delta: f64, cumulative_drift: f64) -> Self {
        Self {
            allowed: false,
            reason: denial.to_string(),
            denial: Some(denial),
            drift_delta,
            cumulative_drift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_format() {
        let record = ActionRecord::new(
            1,
            ActionRequest::new("transfer", "usdc_transfer")
                .amount(50.0)
                .param("to", "bob")
                .param("memo", "rent"),
            1_000,
        );
        assert_eq!(
            record.description(),
            "transfer usdc_transfer amount=50 memo=rent to=bob"
        );

        let bare = ActionRecord::new(2, ActionRequest::new("read", "calendar:2024"), 1_000);
        assert_eq!(bare.description(), "read calendar:2024");
    }

    #[test]
    fn test_reason_strings() {
        let forbidden = DenialReason::ForbiddenResource {
            resource: "payment:process".into(),
            pattern: "payment:*".into(),
        };
        assert!(forbidden.to_string().contains("forbidden"));

        let scope = DenialReason::NotInScope {
            resource: "email:send".into(),
        };
        assert!(scope.to_string().contains("not in allowed scope"));

        let limit = DenialReason::LimitExceeded {
            key: "eth_transfer".into(),
            used: 0.0,
            requested: 1.0,
            limit: 0.0,
        };
        assert!(limit.to_string().contains("exceeds resource limit"));
        assert!(DenialReason::ActionLimitExceeded { limit: 2 }
            .to_string()
            .contains("exceeded"));

        let drift = DenialReason::DriftThresholdExceeded {
            cumulative: 0.8,
            threshold: 0.7,
        };
        assert!(drift.to_string().contains("intent drift exceeded"));

        let revoked = DenialReason::IntentNotActive {
            status: IntentStatus::Revoked,
        };
        assert_eq!(revoked.to_string(), "intent not active (revoked)");
    }

    #[test]
    fn test_violation_classification() {
        assert!(DenialReason::NotInScope {
            resource: "x".into()
        }
        .is_violation());
        assert!(!DenialReason::IntentNotActive {
            status: IntentStatus::Expired
        }
        .is_violation());
        assert!(!DenialReason::TimedOut { after_ms: 10 }.is_violation());
    }

    #[test]
    fn test_result_constructors() {
        let ok = ValidationResult::allowed(0.03, 0.03);
        assert!(ok.allowed);
        assert_eq!(ok.reason, ALLOWED_REASON);
        assert!(ok.denial.is_none());

        let denied = ValidationResult::denied(DenialReason::ActionLimitExceeded { limit: 1 }, 0.0, 0.1);
        assert!(!denied.allowed);
        assert_eq!(denied.denial.as_ref().map(|d| d.code()), Some("action_limit_exceeded"));
    }

    #[test]
    fn test_result_json_shape() {
        let denied = ValidationResult::denied(
            DenialReason::IntentNotActive {
                status: IntentStatus::Revoked,
            },
            0.0,
            0.0,
        );
        let json = serde_json::to_value(&denied).unwrap();
        assert_eq!(json["denial"]["kind"], "intent_not_active");
        assert_eq!(json["denial"]["status"], "revoked");
    }
}

//! Scope evaluation.
//!
//! Checks run in a fixed order and stop at the first denial:
//!
//! 1. The amount must be finite and non-negative.
//! 2. No forbidden pattern may match the resource.
//! 3. Every limit key matching the resource must have room for the amount.
//! 4. Some allowed pattern must match the resource.
//! 5. The allowed-action count must be under `max_actions`.
//!
//! [`check`] is pure. [`evaluate`] also commits an allowed charge.

use iba_core::IntentScope;

use crate::action::DenialReason;
use crate::ledger::{Charge, UsageLedger};

/// Result of evaluating one action against a scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeDecision {
    /// In scope; the charge to commit if the action goes ahead.
    Allow(Charge),
    /// Out of scope.
    Deny(DenialReason),
}

impl ScopeDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ScopeDecision::Allow(_))
    }
}

/// Evaluate without touching the ledger.
pub fn check(
    scope: &IntentScope,
    ledger: &UsageLedger,
    resource: &str,
    amount: Option<f64>,
) -> ScopeDecision {
    let amount = amount.unwrap_or(0.0);
    if !amount.is_finite() || amount < 0.0 {
        return ScopeDecision::Deny(DenialReason::InvalidAmount { amount });
    }

    if let Some(pattern) = scope.forbidden_match(resource) {
        return ScopeDecision::Deny(DenialReason::ForbiddenResource {
            resource: resource.to_string(),
            pattern: pattern.to_string(),
        });
    }

    let mut keys = Vec::new();
    for (key, limit) in scope.limits_for(resource) {
        let used = ledger.used(key.as_str());
        if used + amount > limit {
            return ScopeDecision::Deny(DenialReason::LimitExceeded {
                key: key.to_string(),
                used,
                requested: amount,
                limit,
            });
        }
        keys.push(key.to_string());
    }

    if scope.allowed_match(resource).is_none() {
        return ScopeDecision::Deny(DenialReason::NotInScope {
            resource: resource.to_string(),
        });
    }

    if let Some(limit) = scope.max_actions {
        if ledger.allowed_actions() >= limit {
            return ScopeDecision::Deny(DenialReason::ActionLimitExceeded { limit });
        }
    }

    ScopeDecision::Allow(Charge { keys, amount })
}

/// Evaluate and, if allowed, commit the charge to `ledger`.
pub fn evaluate(
    scope: &IntentScope,
    ledger: &mut UsageLedger,
    resource: &str,
    amount: Option<f64>,
) -> ScopeDecision {
    let decision = check(scope, ledger, resource, amount);
    if let ScopeDecision::Allow(charge) = &decision {
        ledger.commit(charge);
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthcare() -> IntentScope {
        IntentScope::builder()
            .allow("calendar:*")
            .allow("availability:*")
            .allow("appointments:create")
            .forbid("medical_records:*")
            .forbid("payment:*")
            .build()
            .unwrap()
    }

    fn deny_code(decision: &ScopeDecision) -> Option<&'static str> {
        match decision {
            ScopeDecision::Deny(reason) => Some(reason.code()),
            ScopeDecision::Allow(_) => None,
        }
    }

    #[test]
    fn test_allowed_resource() {
        let scope = healthcare();
        let mut ledger = UsageLedger::new(&scope);
        assert!(evaluate(&scope, &mut ledger, "calendar:2024:march", None).is_allowed());
        assert!(evaluate(&scope, &mut ledger, "appointments:create", None).is_allowed());
        assert_eq!(ledger.allowed_actions(), 2);
    }

    #[test]
    fn test_forbidden_beats_allowed() {
        let scope = IntentScope::builder()
            .allow("payment:*")
            .allow("payment:process")
            .forbid("payment:*")
            .build()
            .unwrap();
        let ledger = UsageLedger::new(&scope);
        let decision = check(&scope, &ledger, "payment:process", None);
        assert_eq!(deny_code(&decision), Some("forbidden"));
    }

    #[test]
    fn test_default_deny() {
        let scope = healthcare();
        let ledger = UsageLedger::new(&scope);
        assert_eq!(
            deny_code(&check(&scope, &ledger, "email:send", None)),
            Some("not_in_scope")
        );
        // Prefix of an allowed pattern is not a match.
        assert_eq!(
            deny_code(&check(&scope, &ledger, "calendar", None)),
            Some("not_in_scope")
        );
    }

    #[test]
    fn test_limit_exactness() {
        let scope = IntentScope::builder()
            .allow("usdc_transfer")
            .limit("usdc_transfer", 100.0)
            .build()
            .unwrap();
        let mut ledger = UsageLedger::new(&scope);

        assert!(evaluate(&scope, &mut ledger, "usdc_transfer", Some(60.0)).is_allowed());
        let second = evaluate(&scope, &mut ledger, "usdc_transfer", Some(50.0));
        assert_eq!(
            second,
            ScopeDecision::Deny(DenialReason::LimitExceeded {
                key: "usdc_transfer".into(),
                used: 60.0,
                requested: 50.0,
                limit: 100.0,
            })
        );
        assert_eq!(ledger.used("usdc_transfer"), 60.0);

        // Landing exactly on the cap is allowed.
        assert!(evaluate(&scope, &mut ledger, "usdc_transfer", Some(40.0)).is_allowed());
        assert_eq!(ledger.used("usdc_transfer"), 100.0);
    }

    #[test]
    fn test_zero_cap_denies_positive_amount() {
        let scope = IntentScope::builder()
            .allow("usdc_transfer")
            .limit("eth_transfer", 0.05)
            .limit("gas", 0.0)
            .allow("gas")
            .build()
            .unwrap();
        let ledger = UsageLedger::new(&scope);
        assert_eq!(
            deny_code(&check(&scope, &ledger, "eth_transfer", Some(120_000.0))),
            Some("limit_exceeded")
        );
        assert_eq!(
            deny_code(&check(&scope, &ledger, "gas", Some(0.01))),
            Some("limit_exceeded")
        );
        assert!(check(&scope, &ledger, "gas", None).is_allowed());
    }

    #[test]
    fn test_wildcard_limit_charges_every_match() {
        let scope = IntentScope::builder()
            .allow("api:*")
            .limit("api:*", 10.0)
            .limit("api:search", 10.0)
            .build()
            .unwrap();
        let mut ledger = UsageLedger::new(&scope);
        assert!(evaluate(&scope, &mut ledger, "api:search", Some(4.0)).is_allowed());
        assert_eq!(ledger.used("api:*"), 4.0);
        assert_eq!(ledger.used("api:search"), 4.0);

        assert!(evaluate(&scope, &mut ledger, "api:lookup", Some(4.0)).is_allowed());
        assert_eq!(ledger.used("api:*"), 8.0);
        assert_eq!(ledger.used("api:search"), 4.0);
    }

    #[test]
    fn test_unlimited_resource_ignores_amount() {
        let scope = healthcare();
        let ledger = UsageLedger::new(&scope);
        assert!(check(&scope, &ledger, "calendar:read", Some(1e12)).is_allowed());
    }

    #[test]
    fn test_invalid_amount() {
        let scope = healthcare();
        let ledger = UsageLedger::new(&scope);
        for amount in [-1.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                deny_code(&check(&scope, &ledger, "calendar:read", Some(amount))),
                Some("invalid_amount")
            );
        }
    }

    #[test]
    fn test_max_actions() {
        let scope = IntentScope::builder()
            .allow("api:call")
            .max_actions(2)
            .build()
            .unwrap();
        let mut ledger = UsageLedger::new(&scope);
        assert!(evaluate(&scope, &mut ledger, "api:call", None).is_allowed());
        assert!(evaluate(&scope, &mut ledger, "api:call", None).is_allowed());
        assert_eq!(
            deny_code(&evaluate(&scope, &mut ledger, "api:call", None)),
            Some("action_limit_exceeded")
        );
        assert_eq!(ledger.allowed_actions(), 2);
    }

    #[test]
    fn test_check_leaves_ledger_untouched() {
        let scope = IntentScope::builder()
            .allow("usdc_transfer")
            .limit("usdc_transfer", 100.0)
            .build()
            .unwrap();
        let ledger = UsageLedger::new(&scope);
        let before = ledger.clone();
        assert!(check(&scope, &ledger, "usdc_transfer", Some(10.0)).is_allowed());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_denied_actions_are_not_charged() {
        let scope = IntentScope::builder()
            .allow("usdc_transfer")
            .limit("usdc_transfer", 100.0)
            .max_actions(5)
            .build()
            .unwrap();
        let mut ledger = UsageLedger::new(&scope);
        assert!(!evaluate(&scope, &mut ledger, "usdc_transfer", Some(500.0)).is_allowed());
        assert!(!evaluate(&scope, &mut ledger, "other", Some(1.0)).is_allowed());
        assert_eq!(ledger.used("usdc_transfer"), 0.0);
        assert_eq!(ledger.allowed_actions(), 0);
    }
}

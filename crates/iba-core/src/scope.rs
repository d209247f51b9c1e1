//! Intent scope: the boundary of permitted behavior.
//!
//! A scope is an allow-list and a deny-list of [`ResourcePattern`]s plus
//! numeric caps. Forbidden patterns always win over allowed ones, and a
//! resource that no allowed pattern matches is denied.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoreError, Result};
use crate::pattern::ResourcePattern;

/// The resource boundary of an intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentScope {
    /// Patterns the agent may act on.
    #[serde(default)]
    pub allowed_resources: BTreeSet<ResourcePattern>,

    /// Patterns the agent must never act on.
    #[serde(default)]
    pub forbidden_resources: BTreeSet<ResourcePattern>,

    /// Cumulative caps keyed by resource pattern.
    #[serde(default)]
    pub resource_limits: BTreeMap<ResourcePattern, f64>,

    /// Cap on the number of allowed actions over the intent's lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_actions: Option<u64>,
}

impl IntentScope {
    /// Start building a scope from pattern strings.
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::default()
    }

    /// The first forbidden pattern matching `resource`, if any.
    pub fn forbidden_match(&self, resource: &str) -> Option<&ResourcePattern> {
        self.forbidden_resources.iter().find(|p| p.matches(resource))
    }

    /// The first allowed pattern matching `resource`, if any.
    pub fn allowed_match(&self, resource: &str) -> Option<&ResourcePattern> {
        self.allowed_resources.iter().find(|p| p.matches(resource))
    }

    /// Whether `resource` matches a forbidden pattern.
    pub fn is_forbidden(&self, resource: &str) -> bool {
        self.forbidden_match(resource).is_some()
    }

    /// Whether `resource` is allowed and not forbidden.
    ///
    /// Advisory only: limits are not considered.
    pub fn is_allowed(&self, resource: &str) -> bool {
        !self.is_forbidden(resource) && self.allowed_match(resource).is_some()
    }

    /// All limit entries whose key matches `resource`.
    pub fn limits_for<'a>(
        &'a self,
        resource: &'a str,
    ) -> impl Iterator<Item = (&'a ResourcePattern, f64)> + 'a {
        self.resource_limits
            .iter()
            .filter(move |(key, _)| key.matches(resource))
            .map(|(key, cap)| (key, *cap))
    }

    /// Check the caps for consistency.
    ///
    /// Caps must be finite and non-negative. Two distinct keys that can match
    /// the same resource must carry the same cap. A cap of zero is valid.
    pub fn validate(&self) -> Result<()> {
        for (key, cap) in &self.resource_limits {
            if !cap.is_finite() || *cap < 0.0 {
                return Err(CoreError::malformed(format!(
                    "limit for {key} must be a finite non-negative number, got {cap}"
                )));
            }
        }

        let entries: Vec<_> = self.resource_limits.iter().collect();
        for (i, (key_a, cap_a)) in entries.iter().enumerate() {
            for (key_b, cap_b) in &entries[i + 1..] {
                if cap_a != cap_b && key_a.overlaps(key_b) {
                    return Err(CoreError::malformed(format!(
                        "contradictory limits: {key_a} = {cap_a} overlaps {key_b} = {cap_b}"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Builder for [`IntentScope`] taking pattern strings.
///
/// Pattern errors are collected and reported by [`ScopeBuilder::build`].
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    allowed: Vec<String>,
    forbidden: Vec<String>,
    limits: Vec<(String, f64)>,
    max_actions: Option<u64>,
}

impl ScopeBuilder {
    /// Allow a resource pattern.
    pub fn allow(mut self, pattern: impl Into<String>) -> Self {
        self.allowed.push(pattern.into());
        self
    }

    /// Forbid a resource pattern.
    pub fn forbid(mut self, pattern: impl Into<String>) -> Self {
        self.forbidden.push(pattern.into());
        self
    }

    /// Cap the cumulative amount for resources matching `pattern`.
    pub fn limit(mut self, pattern: impl Into<String>, cap: f64) -> Self {
        self.limits.push((pattern.into(), cap));
        self
    }

    /// Cap the number of allowed actions.
    pub fn max_actions(mut self, count: u64) -> Self {
        self.max_actions = Some(count);
        self
    }

    /// Parse every pattern and validate the caps.
    pub fn build(self) -> Result<IntentScope> {
        let allowed_resources = self
            .allowed
            .iter()
            .map(|s| ResourcePattern::parse(s))
            .collect::<Result<BTreeSet<_>>>()?;

        let forbidden_resources = self
            .forbidden
            .iter()
            .map(|s| ResourcePattern::parse(s))
            .collect::<Result<BTreeSet<_>>>()?;

        let mut resource_limits = BTreeMap::new();
        for (raw, cap) in &self.limits {
            let key = ResourcePattern::parse(raw)?;
            if resource_limits.insert(key, *cap).is_some() {
                return Err(CoreError::malformed(format!("duplicate limit key {raw}")));
            }
        }

        let scope = IntentScope {
            allowed_resources,
            forbidden_resources,
            resource_limits,
            max_actions: self.max_actions,
        };
        scope.validate()?;
        Ok(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_allowed() {
        let scope = IntentScope::builder()
            .allow("calendar:read")
            .allow("calendar:write")
            .build()
            .unwrap();
        assert!(scope.is_allowed("calendar:read"));
        assert!(scope.is_allowed("calendar:write"));
        assert!(!scope.is_allowed("calendar:delete"));
    }

    #[test]
    fn test_wildcard_allowed() {
        let scope = IntentScope::builder().allow("calendar:*").build().unwrap();
        assert!(scope.is_allowed("calendar:read"));
        assert!(scope.is_allowed("calendar:delete"));
        assert!(!scope.is_allowed("medical:read"));
    }

    #[test]
    fn test_forbidden_overrides_allowed() {
        let scope = IntentScope::builder()
            .allow("*")
            .forbid("medical_records:*")
            .build()
            .unwrap();
        assert!(scope.is_allowed("calendar:read"));
        assert!(!scope.is_allowed("medical_records:patient_data"));
        assert!(scope.is_forbidden("medical_records:patient_data"));
    }

    #[test]
    fn test_forbidden_wins_on_identical_pattern() {
        let scope = IntentScope::builder()
            .allow("medical_records:*")
            .forbid("medical_records:*")
            .build()
            .unwrap();
        assert!(!scope.is_allowed("medical_records:patient_data"));
    }

    #[test]
    fn test_empty_scope_denies_everything() {
        let scope = IntentScope::default();
        assert!(!scope.is_allowed("calendar:read"));
        assert!(!scope.is_forbidden("calendar:read"));
    }

    #[test]
    fn test_limits_for_matches_patterns() {
        let scope = IntentScope::builder()
            .allow("payment:*")
            .limit("payment:*", 100.0)
            .limit("usdc_transfer", 50.0)
            .build()
            .unwrap();
        let hits: Vec<_> = scope
            .limits_for("payment:card")
            .map(|(k, cap)| (k.as_str().to_string(), cap))
            .collect();
        assert_eq!(hits, vec![("payment:*".to_string(), 100.0)]);
        assert_eq!(scope.limits_for("calendar:read").count(), 0);
    }

    #[test]
    fn test_zero_limit_is_valid() {
        let scope = IntentScope::builder()
            .allow("eth_transfer")
            .limit("eth_transfer", 0.0)
            .build();
        assert!(scope.is_ok());
    }

    #[test]
    fn test_contradictory_limits_rejected() {
        let result = IntentScope::builder()
            .limit("payment:*", 10.0)
            .limit("payment:card", 20.0)
            .build();
        assert!(matches!(result, Err(CoreError::MalformedDeclaration(_))));
    }

    #[test]
    fn test_overlapping_equal_limits_accepted() {
        let result = IntentScope::builder()
            .limit("payment:*", 10.0)
            .limit("payment:card", 10.0)
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_cap_rejected() {
        assert!(IntentScope::builder().limit("a", -1.0).build().is_err());
        assert!(IntentScope::builder().limit("a", f64::NAN).build().is_err());
        assert!(IntentScope::builder()
            .limit("a", f64::INFINITY)
            .build()
            .is_err());
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let result = IntentScope::builder().allow("calendar::read").build();
        assert!(matches!(result, Err(CoreError::InvalidPattern { .. })));
    }

    #[test]
    fn test_scope_json_roundtrip() {
        let scope = IntentScope::builder()
            .allow("calendar:*")
            .forbid("payment:*")
            .limit("usdc_transfer", 100.0)
            .max_actions(50)
            .build()
            .unwrap();
        let json = serde_json::to_string(&scope).unwrap();
        let back: IntentScope = serde_json::from_str(&json).unwrap();
        assert_eq!(scope, back);
    }
}

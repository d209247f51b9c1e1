//! Cumulative usage per resource limit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use iba_core::IntentScope;

/// Amounts to add to the ledger once an action is allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// Limit keys matched by the resource.
    pub keys: Vec<String>,
    /// Amount charged to every key.
    pub amount: f64,
}

/// Running totals for one engine.
///
/// Only allowed actions are charged. Usage never decreases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageLedger {
    usage: BTreeMap<String, f64>,
    allowed_actions: u64,
}

impl UsageLedger {
    /// Zeroed ledger with one entry per limit key in `scope`.
    pub fn new(scope: &IntentScope) -> Self {
        Self {
            usage: scope
                .resource_limits
                .keys()
                .map(|key| (key.as_str().to_string(), 0.0))
                .collect(),
            allowed_actions: 0,
        }
    }

    /// Amount charged against `key` so far.
    pub fn used(&self, key: &str) -> f64 {
        self.usage.get(key).copied().unwrap_or(0.0)
    }

    /// Number of allowed actions so far.
    pub fn allowed_actions(&self) -> u64 {
        self.allowed_actions
    }

    /// All tracked keys and their usage.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.usage.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Record an allowed action.
    pub fn commit(&mut self, charge: &Charge) {
        for key in &charge.keys {
            *self.usage.entry(key.clone()).or_insert(0.0) += charge.amount;
        }
        self.allowed_actions += 1;
    }
}

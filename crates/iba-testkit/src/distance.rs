//! Deterministic distance functions for drift tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use iba_engine::PurposeDistance;

/// Returns the same distance for every action.
#[derive(Debug, Clone, Copy)]
pub struct FixedDistance(pub f64);

impl PurposeDistance for FixedDistance {
    fn distance(&self, _purpose: &str, _action_description: &str) -> f64 {
        self.0
    }
}

/// Returns queued distances in order, then `fallback`.
#[derive(Debug)]
pub struct ScriptedDistance {
    script: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedDistance {
    pub fn new(script: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
        }
    }
}

impl PurposeDistance for ScriptedDistance {
    fn distance(&self, _purpose: &str, _action_description: &str) -> f64 {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

/// Distance chosen by the first rule whose needle appears in the action
/// description.
#[derive(Debug, Clone)]
pub struct KeywordDistance {
    rules: Vec<(String, f64)>,
    default: f64,
}

impl KeywordDistance {
    pub fn new(default: f64) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    pub fn rule(mut self, needle: impl Into<String>, distance: f64) -> Self {
        self.rules.push((needle.into(), distance));
        self
    }
}

impl PurposeDistance for KeywordDistance {
    fn distance(&self, _purpose: &str, action_description: &str) -> f64 {
        self.rules
            .iter()
            .find(|(needle, _)| action_description.contains(needle.as_str()))
            .map_or(self.default, |(_, distance)| *distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_then_fallback() {
        let distance = ScriptedDistance::new([0.1, 0.9], 0.5);
        assert_eq!(distance.distance("p", "a"), 0.1);
        assert_eq!(distance.distance("p", "a"), 0.9);
        assert_eq!(distance.distance("p", "a"), 0.5);
    }

    #[test]
    fn test_keyword_first_match_wins() {
        let distance = KeywordDistance::new(0.0)
            .rule("payment", 0.9)
            .rule("pay", 0.4);
        assert_eq!(distance.distance("p", "process payment:card"), 0.9);
        assert_eq!(distance.distance("p", "pay rent"), 0.4);
        assert_eq!(distance.distance("p", "read calendar:today"), 0.0);
    }
}

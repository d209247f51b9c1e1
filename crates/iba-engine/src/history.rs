//! Append-only action history and summary statistics.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::action::{ActionRecord, ValidationResult};

/// One validated action and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub record: ActionRecord,
    pub result: ValidationResult,
}

impl HistoryEntry {
    pub fn sequence_no(&self) -> u64 {
        self.record.sequence_no
    }
}

/// In-memory history in sequence order.
///
/// With a capacity set, the oldest entries are dropped once it is reached.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: Option<usize>,
    evicted: u64,
}

impl History {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            evicted: 0,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if let Some(capacity) = self.capacity {
            while self.entries.len() >= capacity {
                self.entries.pop_front();
                self.evicted += 1;
            }
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dropped to stay within capacity.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Entries with `sequence_no > after`.
    pub fn since(&self, after: u64) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.sequence_no() > after)
            .cloned()
            .collect()
    }
}

/// Running totals over every validated action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_actions: u64,
    pub allowed: u64,
    /// Every denial, including calls on an intent that is no longer active.
    pub blocked: u64,
    /// Denials that were scope or drift violations.
    #[serde(default)]
    pub violations: u64,
}

impl ValidationStats {
    pub fn record(&mut self, result: &ValidationResult) {
        self.total_actions += 1;
        match &result.denial {
            None => self.allowed += 1,
            Some(denial) => {
                self.blocked += 1;
                if denial.is_violation() {
                    self.violations += 1;
                }
            }
        }
    }

    /// Fraction of actions blocked; 0 when nothing was validated.
    pub fn violation_rate(&self) -> f64 {
        if self.total_actions == 0 {
            0.0
        } else {
            self.blocked as f64 / self.total_actions as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionRequest, DenialReason};
    use iba_core::IntentStatus;

    fn entry(seq: u64) -> HistoryEntry {
        HistoryEntry {
            record: ActionRecord::new(seq, ActionRequest::new("read", "calendar:today"), 0),
            result: ValidationResult::allowed(0.0, 0.0),
        }
    }

    #[test]
    fn test_unbounded_history() {
        let mut history = History::new(None);
        for seq in 1..=5 {
            history.push(entry(seq));
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.evicted(), 0);
        let seqs: Vec<u64> = history.iter().map(HistoryEntry::sequence_no).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new(Some(2));
        for seq in 1..=5 {
            history.push(entry(seq));
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.evicted(), 3);
        let seqs: Vec<u64> = history.to_vec().iter().map(|e| e.sequence_no()).collect();
        assert_eq!(seqs, vec![4, 5]);
    }

    #[test]
    fn test_since() {
        let mut history = History::new(None);
        for seq in 1..=4 {
            history.push(entry(seq));
        }
        let tail = history.since(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence_no(), 3);
        assert!(history.since(4).is_empty());
    }

    #[test]
    fn test_stats() {
        let allowed = ValidationResult::allowed(0.0, 0.0);
        let violation = ValidationResult::denied(
            DenialReason::NotInScope {
                resource: "email:send".into(),
            },
            0.0,
            0.0,
        );
        let inactive = ValidationResult::denied(
            DenialReason::IntentNotActive {
                status: IntentStatus::Revoked,
            },
            0.0,
            0.0,
        );

        let mut stats = ValidationStats::default();
        assert_eq!(stats.violation_rate(), 0.0);
        stats.record(&allowed);
        stats.record(&violation);
        stats.record(&inactive);
        stats.record(&allowed);
        assert_eq!(stats.total_actions, 4);
        assert_eq!(stats.allowed, 2);
        assert_eq!(stats.blocked, 2);
        assert_eq!(stats.violations, 1);
        assert_eq!(stats.violation_rate(), 0.5);
    }
}

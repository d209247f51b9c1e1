//! Terminal state changes, applied exactly once.
//!
//! The manager owns the intent's status. Every exit from `Active` goes
//! through [`RevocationManager::transition`], which records why and when.
//! Once a record exists it never changes.

use serde::{Deserialize, Serialize};
use std::fmt;

use iba_core::IntentStatus;

use crate::lifecycle::{self, InvalidTransition, LifecycleEvent};

/// Why an intent left `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    Completed,
    Violated,
    Expired,
    Manual,
}

impl RevocationReason {
    pub fn event(self) -> LifecycleEvent {
        match self {
            RevocationReason::Completed => LifecycleEvent::Complete,
            RevocationReason::Violated => LifecycleEvent::Violation,
            RevocationReason::Expired => LifecycleEvent::Expire,
            RevocationReason::Manual => LifecycleEvent::ManualRevoke,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RevocationReason::Completed => "completed",
            RevocationReason::Violated => "violated",
            RevocationReason::Expired => "expired",
            RevocationReason::Manual => "manual",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single record of an intent's terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRecord {
    pub reason: RevocationReason,
    /// Status the intent moved to.
    pub status: IntentStatus,
    /// Unix milliseconds.
    pub timestamp: i64,
    /// Action that caused a `Violated` revocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggering_sequence_no: Option<u64>,
}

/// Result of a revoke call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationOutcome {
    /// This call moved the intent to a terminal state.
    Applied(RevocationRecord),
    /// The intent was already terminal; carries the earlier record.
    AlreadyTerminal(RevocationRecord),
}

impl RevocationOutcome {
    pub fn record(&self) -> &RevocationRecord {
        match self {
            RevocationOutcome::Applied(record) | RevocationOutcome::AlreadyTerminal(record) => {
                record
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, RevocationOutcome::Applied(_))
    }
}

/// Owner of an intent's status and revocation record.
#[derive(Debug, Clone, Default)]
pub struct RevocationManager {
    record: Option<RevocationRecord>,
}

impl RevocationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status; `Active` until a record exists.
    pub fn status(&self) -> IntentStatus {
        self.record
            .as_ref()
            .map_or(IntentStatus::Active, |record| record.status)
    }

    pub fn record(&self) -> Option<&RevocationRecord> {
        self.record.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.record.is_some()
    }

    /// Apply `reason` if the intent is still active.
    pub fn transition(
        &mut self,
        reason: RevocationReason,
        triggering_sequence_no: Option<u64>,
        now: i64,
    ) -> Result<RevocationRecord, InvalidTransition> {
        let status = lifecycle::transition(self.status(), reason.event())?;
        Ok(self.apply(reason, status, triggering_sequence_no, now))
    }

    /// Revoke, or report the existing record if already terminal.
    pub fn revoke(
        &mut self,
        reason: RevocationReason,
        triggering_sequence_no: Option<u64>,
        now: i64,
    ) -> RevocationOutcome {
        match (
            lifecycle::transition(self.status(), reason.event()),
            self.record.clone(),
        ) {
            (Ok(status), _) => {
                RevocationOutcome::Applied(self.apply(reason, status, triggering_sequence_no, now))
            }
            (Err(_), Some(existing)) => RevocationOutcome::AlreadyTerminal(existing),
            // Status is derived from the record, so only a recorded intent is terminal.
            (Err(invalid), None) => unreachable!("{invalid} with no revocation record"),
        }
    }

    fn apply(
        &mut self,
        reason: RevocationReason,
        status: IntentStatus,
        triggering_sequence_no: Option<u64>,
        now: i64,
    ) -> RevocationRecord {
        let record = RevocationRecord {
            reason,
            status,
            timestamp: now,
            triggering_sequence_no: match reason {
                RevocationReason::Violated => triggering_sequence_no,
                _ => None,
            },
        };
        self.record = Some(record.clone());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_active() {
        let manager = RevocationManager::new();
        assert_eq!(manager.status(), IntentStatus::Active);
        assert!(manager.record().is_none());
        assert!(!manager.is_terminal());
    }

    #[test]
    fn test_violation_records_sequence() {
        let mut manager = RevocationManager::new();
        let outcome = manager.revoke(RevocationReason::Violated, Some(4), 1_000);
        assert!(outcome.is_applied());
        assert_eq!(
            outcome.record(),
            &RevocationRecord {
                reason: RevocationReason::Violated,
                status: IntentStatus::Revoked,
                timestamp: 1_000,
                triggering_sequence_no: Some(4),
            }
        );
        assert_eq!(manager.status(), IntentStatus::Revoked);
    }

    #[test]
    fn test_sequence_only_kept_for_violations() {
        let mut manager = RevocationManager::new();
        let outcome = manager.revoke(RevocationReason::Manual, Some(4), 1_000);
        assert_eq!(outcome.record().triggering_sequence_no, None);
    }

    #[test]
    fn test_applied_exactly_once() {
        let mut manager = RevocationManager::new();
        let first = manager.revoke(RevocationReason::Expired, None, 1_000);
        let second = manager.revoke(RevocationReason::Manual, None, 2_000);
        assert!(first.is_applied());
        assert_eq!(second, RevocationOutcome::AlreadyTerminal(first.record().clone()));
        assert_eq!(manager.status(), IntentStatus::Expired);
    }

    #[test]
    fn test_complete_after_terminal_is_invalid() {
        let mut manager = RevocationManager::new();
        manager.revoke(RevocationReason::Manual, None, 1_000);
        let err = manager
            .transition(RevocationReason::Completed, None, 2_000)
            .unwrap_err();
        assert_eq!(err.from, IntentStatus::Revoked);
        assert_eq!(err.event, LifecycleEvent::Complete);
        assert_eq!(manager.record().map(|r| r.timestamp), Some(1_000));
    }

    #[test]
    fn test_revoke_follows_lifecycle_targets() {
        for reason in [
            RevocationReason::Completed,
            RevocationReason::Violated,
            RevocationReason::Expired,
            RevocationReason::Manual,
        ] {
            let mut manager = RevocationManager::new();
            let outcome = manager.revoke(reason, None, 1);
            assert_eq!(
                Ok(outcome.record().status),
                lifecycle::transition(IntentStatus::Active, reason.event())
            );
            assert_eq!(manager.status(), outcome.record().status);
        }
    }

    #[test]
    fn test_complete() {
        let mut manager = RevocationManager::new();
        let record = manager
            .transition(RevocationReason::Completed, None, 5)
            .unwrap();
        assert_eq!(record.status, IntentStatus::Completed);
        assert_eq!(manager.status(), IntentStatus::Completed);
    }
}

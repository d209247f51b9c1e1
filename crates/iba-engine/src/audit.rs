//! Audit event delivery.
//!
//! The engine emits one [`AuditEvent::Action`] per validation call and one
//! [`AuditEvent::Revocation`] when the intent leaves `Active`. Events are
//! emitted while the engine lock is held, so a sink sees them in sequence
//! order. Sinks must not call back into the engine that emitted the event.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use crate::history::HistoryEntry;
use crate::revocation::RevocationRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    Action {
        intent_id: String,
        entry: HistoryEntry,
    },
    Revocation {
        intent_id: String,
        record: RevocationRecord,
    },
}

impl AuditEvent {
    pub fn intent_id(&self) -> &str {
        match self {
            AuditEvent::Action { intent_id, .. } | AuditEvent::Revocation { intent_id, .. } => {
                intent_id
            }
        }
    }
}

/// Receiver for audit events.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &AuditEvent);
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event received so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: &AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Forwards events to `tracing` under the `iba::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: &AuditEvent) {
        match event {
            AuditEvent::Action { intent_id, entry } => tracing::info!(
                target: "iba::audit",
                intent_id = %intent_id,
                seq = entry.record.sequence_no,
                action_type = %entry.record.action_type,
                resource = %entry.record.resource,
                allowed = entry.result.allowed,
                cumulative_drift = entry.result.cumulative_drift,
                "{}",
                entry.result.reason
            ),
            AuditEvent::Revocation { intent_id, record } => tracing::info!(
                target: "iba::audit",
                intent_id = %intent_id,
                reason = %record.reason,
                status = %record.status,
                triggering_seq = ?record.triggering_sequence_no,
                "intent left active state"
            ),
        }
    }
}

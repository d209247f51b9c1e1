//! Intent lifecycle state machine.
//!
//! ```text
//!            complete            expire            violation / manual revoke
//! Completed <-------- Active --------> Expired     Active ------------------> Revoked
//! ```
//!
//! `Active` is the only state with outgoing edges.

use serde::{Deserialize, Serialize};
use std::fmt;

use iba_core::IntentStatus;

use crate::error::EngineError;

/// Something that moves an intent out of `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The agent finished its task.
    Complete,
    /// The validity window closed.
    Expire,
    /// A scope or drift violation.
    Violation,
    /// An operator revoked the intent.
    ManualRevoke,
}

impl LifecycleEvent {
    /// Status reached when this event is applied to an active intent.
    pub fn target(self) -> IntentStatus {
        match self {
            LifecycleEvent::Complete => IntentStatus::Completed,
            LifecycleEvent::Expire => IntentStatus::Expired,
            LifecycleEvent::Violation | LifecycleEvent::ManualRevoke => IntentStatus::Revoked,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::Complete => "complete",
            LifecycleEvent::Expire => "expire",
            LifecycleEvent::Violation => "revoke on violation",
            LifecycleEvent::ManualRevoke => "revoke",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempted transition out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: IntentStatus,
    pub event: LifecycleEvent,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} an intent that is {}", self.event, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

impl From<InvalidTransition> for EngineError {
    fn from(e: InvalidTransition) -> Self {
        EngineError::InvalidTransition {
            from: e.from,
            event: e.event.as_str(),
        }
    }
}

/// The transition function.
pub fn transition(
    current: IntentStatus,
    event: LifecycleEvent,
) -> Result<IntentStatus, InvalidTransition> {
    match current {
        IntentStatus::Active => Ok(event.target()),
        from => Err(InvalidTransition { from, event }),
    }
}

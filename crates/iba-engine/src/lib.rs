//! # IBA Engine
//!
//! Runtime enforcement for signed intents. A [`ValidationEngine`] checks each
//! proposed action against the intent's scope and limits, scores its drift
//! from the declared purpose, and revokes the intent on the first violation.
//!
//! ## Components
//!
//! - [`evaluator`] - scope and limit checks against a [`UsageLedger`]
//! - [`drift`] - EWMA drift scoring over a pluggable [`PurposeDistance`]
//! - [`lifecycle`] / [`revocation`] - terminal state changes, applied once
//! - [`history`] / [`audit`] - append-only action log and audit delivery
//! - [`cancel`] - caller-side cancellation of a pending validation
//!
//! The engine is synchronous and `Send + Sync`; share it with `Arc`.

pub mod action;
pub mod audit;
pub mod cancel;
pub mod config;
pub mod drift;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod ledger;
pub mod lifecycle;
pub mod revocation;

pub use action::{ActionRecord, ActionRequest, DenialReason, ValidationResult, ALLOWED_REASON};
pub use audit::{AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use cancel::CancelToken;
pub use config::{DriftConfig, EngineConfig};
pub use drift::{
    normalize_distance, DriftDetector, DriftReport, DriftScore, DriftSignal, NoDrift,
    PurposeDistance,
};
pub use engine::ValidationEngine;
pub use error::{EngineError, Result};
pub use evaluator::{check, evaluate, ScopeDecision};
pub use history::{History, HistoryEntry, ValidationStats};
pub use ledger::{Charge, UsageLedger};
pub use lifecycle::{transition, InvalidTransition, LifecycleEvent};
pub use revocation::{RevocationManager, RevocationOutcome, RevocationReason, RevocationRecord};

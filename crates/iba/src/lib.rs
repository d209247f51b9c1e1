//! # IBA
//!
//! Intent-bound authorization for autonomous agents.
//!
//! An agent is authorized by a signed, bounded statement of purpose (an
//! *intent*) rather than by identity alone. Every action the agent attempts
//! is checked against that purpose, and the intent is revoked the moment the
//! agent steps outside it.
//!
//! ## Overview
//!
//! - **Intents**: purpose, resource scope, numeric limits and a validity
//!   window, signed with Ed25519 by the issuing principal
//! - **Scope**: `:`-delimited resource patterns; forbidden beats allowed,
//!   and anything not allowed is denied
//! - **Drift**: an EWMA of semantic distance between the declared purpose
//!   and each action, from a pluggable distance function
//! - **Lifecycle**: `Active` until completed, expired or revoked; terminal
//!   states are final
//!
//! ## Usage
//!
//! ```rust,no_run
//! use iba::{ActionRequest, Authority, EngineConfig, IntentScope, NoDrift};
//!
//! let authority = Authority::generate("user@example.com");
//! let scope = IntentScope::builder()
//!     .allow("calendar:*")
//!     .forbid("medical_records:*")
//!     .build()
//!     .unwrap();
//! let payload = authority
//!     .intent("intent-001", "Schedule a doctor appointment")
//!     .scope(scope)
//!     .expires_in(3_600_000)
//!     .build()
//!     .unwrap();
//! let declaration = authority.sign(payload).unwrap();
//!
//! let engine = authority
//!     .open(declaration, NoDrift, EngineConfig::default())
//!     .unwrap();
//! let result = engine.validate_action(ActionRequest::new("read", "calendar:today"));
//! assert!(result.allowed);
//! ```
//!
//! ## Re-exports
//!
//! - `iba::core` - intents, scopes, patterns, signing
//! - `iba::engine` - validation engine, drift, revocation, audit

pub mod authority;
pub mod error;
pub mod guard;

pub use iba_core as core;
pub use iba_engine as engine;

pub use authority::{open_engine, Authority, KeyDirectory};
pub use error::{IbaError, Result};
pub use guard::IntentGuard;

pub use iba_core::{
    Ed25519PublicKey, Ed25519Signature, IntentBuilder, IntentDeclaration, IntentDigest,
    IntentPayload, IntentScope, IntentStatus, Keypair, ResourcePattern, ScopeBuilder,
};
pub use iba_engine::{
    ActionRecord, ActionRequest, AuditEvent, AuditSink, CancelToken, DenialReason, DriftConfig,
    DriftReport, EngineConfig, EngineError, HistoryEntry, MemoryAuditSink, NoDrift,
    PurposeDistance, RevocationOutcome, RevocationReason, RevocationRecord, TracingAuditSink,
    ValidationEngine, ValidationResult, ValidationStats,
};

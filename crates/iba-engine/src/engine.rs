//! The validation engine.
//!
//! One engine owns one verified intent for its lifetime, together with the
//! usage ledger, drift score, history and revocation state. All of that sits
//! behind a single mutex, so each `validate_action` call is one atomic step:
//! a revocation caused by one call is seen by every later call.
//!
//! ## Decision procedure
//!
//! For each action the engine:
//!
//! 1. assigns the next sequence number;
//! 2. expires the intent if `now >= expires_at`;
//! 3. denies without side effects if the intent is no longer active;
//! 4. evaluates the scope, revoking on denial;
//! 5. scores drift, revoking if the cumulative score crosses the threshold;
//! 6. otherwise commits the charge to the ledger and allows.
//!
//! Steps 3-5 only decide; the ledger, drift score and revocation state change
//! once the decision is final. A validation run with a [`CancelToken`] that
//! the caller cancels first is recorded as a `TimedOut` denial instead, with
//! no other effect.
//!
//! Every call is appended to the history and sent to the audit sink.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use iba_core::{binder, now_millis, Ed25519PublicKey, IntentDeclaration, IntentStatus};

use crate::action::{ActionRecord, ActionRequest, DenialReason, ValidationResult};
use crate::audit::{AuditEvent, AuditSink};
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::drift::{DriftDetector, DriftReport, PurposeDistance};
use crate::error::{EngineError, Result};
use crate::evaluator::{self, ScopeDecision};
use crate::history::{History, HistoryEntry, ValidationStats};
use crate::ledger::{Charge, UsageLedger};
use crate::revocation::{RevocationManager, RevocationOutcome, RevocationReason, RevocationRecord};

/// Mutable per-intent state.
struct EngineState {
    declaration: IntentDeclaration,
    ledger: UsageLedger,
    cumulative_drift: f64,
    next_sequence_no: u64,
    stats: ValidationStats,
    history: History,
    revocation: RevocationManager,
}

/// State change that goes with a decision.
enum Effect {
    None,
    Commit { charge: Charge, cumulative: f64 },
    Revoke { cumulative: f64 },
}

struct Outcome {
    result: ValidationResult,
    effect: Effect,
}

/// Validates actions against one signed intent.
pub struct ValidationEngine {
    intent_id: String,
    config: EngineConfig,
    detector: DriftDetector,
    distance: Box<dyn PurposeDistance>,
    audit: Option<Arc<dyn AuditSink>>,
    state: Mutex<EngineState>,
}

impl ValidationEngine {
    /// Verify `declaration` and take ownership of it.
    ///
    /// Fails with `InvalidConfig`, `MalformedDeclaration` or
    /// `SignatureInvalid`. The declaration must still be active.
    pub fn new(
        declaration: IntentDeclaration,
        public_key: &Ed25519PublicKey,
        distance: impl PurposeDistance + 'static,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        declaration.payload.validate()?;
        binder::verify_strict(&declaration, public_key).map_err(|_| EngineError::SignatureInvalid)?;
        if declaration.status.is_terminal() {
            return Err(EngineError::MalformedDeclaration(format!(
                "declaration is already {}",
                declaration.status
            )));
        }

        let intent_id = declaration.intent_id().to_string();
        tracing::info!(
            intent_id = %intent_id,
            authorized_by = %declaration.authorized_by(),
            digest = %declaration.digest(),
            "validation engine created"
        );

        let state = EngineState {
            ledger: UsageLedger::new(declaration.scope()),
            cumulative_drift: 0.0,
            next_sequence_no: 1,
            stats: ValidationStats::default(),
            history: History::new(config.history_capacity),
            revocation: RevocationManager::new(),
            declaration,
        };

        Ok(Self {
            intent_id,
            detector: DriftDetector::new(&config.drift),
            config,
            distance: Box::new(distance),
            audit: None,
            state: Mutex::new(state),
        })
    }

    /// Send audit events to `sink`.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn intent_id(&self) -> &str {
        &self.intent_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate an action at the current time.
    pub fn validate_action(&self, request: ActionRequest) -> ValidationResult {
        self.validate_action_at(request, now_millis())
    }

    /// Validate an action at `now` (Unix milliseconds).
    pub fn validate_action_at(&self, request: ActionRequest, now: i64) -> ValidationResult {
        self.run(request, now, None)
    }

    /// Validate an action at the current time unless `cancel` is cancelled
    /// before the decision is final.
    pub fn validate_action_cancellable(
        &self,
        request: ActionRequest,
        cancel: &CancelToken,
    ) -> ValidationResult {
        self.run(request, now_millis(), Some(cancel))
    }

    /// [`Self::validate_action_cancellable`] at `now`.
    pub fn validate_action_cancellable_at(
        &self,
        request: ActionRequest,
        now: i64,
        cancel: &CancelToken,
    ) -> ValidationResult {
        self.run(request, now, Some(cancel))
    }

    fn run(&self, request: ActionRequest, now: i64, cancel: Option<&CancelToken>) -> ValidationResult {
        let mut guard = self.lock();
        let state = &mut *guard;

        let sequence_no = state.next_sequence_no;
        state.next_sequence_no += 1;
        let record = ActionRecord::new(sequence_no, request, now);

        self.expire_if_due(state, now);

        let Outcome { result, effect } = self.settle(state, &record, cancel);
        let revocation = self.apply(state, effect, &record, now);

        state.stats.record(&result);
        let entry = HistoryEntry {
            record,
            result: result.clone(),
        };
        self.emit(AuditEvent::Action {
            intent_id: self.intent_id.clone(),
            entry: entry.clone(),
        });
        state.history.push(entry);
        if let Some(record) = revocation {
            self.emit_revocation(record);
        }
        result
    }

    /// Decide, then claim the decision against `cancel`.
    fn settle(
        &self,
        state: &EngineState,
        record: &ActionRecord,
        cancel: Option<&CancelToken>,
    ) -> Outcome {
        let Some(token) = cancel else {
            return self.decide(state, record);
        };
        if !token.is_cancelled() {
            let outcome = self.decide(state, record);
            if token.claim() {
                return outcome;
            }
        }

        let denial = token.denial();
        tracing::warn!(
            intent_id = %self.intent_id,
            seq = record.sequence_no,
            resource = %record.resource,
            denial = denial.code(),
            "validation cancelled by caller"
        );
        Outcome {
            result: ValidationResult::denied(denial, 0.0, state.cumulative_drift),
            effect: Effect::None,
        }
    }

    /// Steps 3-5 of the decision procedure, without side effects.
    fn decide(&self, state: &EngineState, record: &ActionRecord) -> Outcome {
        let status = state.revocation.status();
        if status.is_terminal() {
            tracing::debug!(
                intent_id = %self.intent_id,
                seq = record.sequence_no,
                resource = %record.resource,
                status = %status,
                "action on inactive intent denied"
            );
            return Outcome {
                result: ValidationResult::denied(
                    DenialReason::IntentNotActive { status },
                    0.0,
                    state.cumulative_drift,
                ),
                effect: Effect::None,
            };
        }

        let decision = evaluator::check(
            state.declaration.scope(),
            &state.ledger,
            &record.resource,
            record.amount,
        );
        let charge = match decision {
            ScopeDecision::Allow(charge) => charge,
            ScopeDecision::Deny(denial) => {
                return Outcome {
                    result: ValidationResult::denied(denial, 0.0, state.cumulative_drift),
                    effect: Effect::Revoke {
                        cumulative: state.cumulative_drift,
                    },
                };
            }
        };

        let score = self.detector.measure(
            self.distance.as_ref(),
            state.declaration.declared_purpose(),
            record,
            state.cumulative_drift,
        );

        if self.detector.exceeds(score.cumulative) {
            let denial = DenialReason::DriftThresholdExceeded {
                cumulative: score.cumulative,
                threshold: self.detector.threshold(),
            };
            return Outcome {
                result: ValidationResult::denied(denial, score.delta, score.cumulative),
                effect: Effect::Revoke {
                    cumulative: score.cumulative,
                },
            };
        }

        Outcome {
            result: ValidationResult::allowed(score.delta, score.cumulative),
            effect: Effect::Commit {
                charge,
                cumulative: score.cumulative,
            },
        }
    }

    /// Step 6, or the revocation for steps 4-5. Returns any revocation applied.
    fn apply(
        &self,
        state: &mut EngineState,
        effect: Effect,
        record: &ActionRecord,
        now: i64,
    ) -> Option<RevocationRecord> {
        let seq = record.sequence_no;
        match effect {
            Effect::None => None,
            Effect::Commit { charge, cumulative } => {
                state.ledger.commit(&charge);
                state.cumulative_drift = cumulative;
                tracing::debug!(
                    intent_id = %self.intent_id,
                    seq,
                    resource = %record.resource,
                    cumulative_drift = cumulative,
                    "action allowed"
                );
                None
            }
            Effect::Revoke { cumulative } => {
                state.cumulative_drift = cumulative;
                tracing::warn!(
                    intent_id = %self.intent_id,
                    seq,
                    resource = %record.resource,
                    cumulative_drift = cumulative,
                    "violation, revoking intent"
                );
                self.revoke_on_violation(state, seq, now)
            }
        }
    }

    fn revoke_on_violation(
        &self,
        state: &mut EngineState,
        seq: u64,
        now: i64,
    ) -> Option<RevocationRecord> {
        match state
            .revocation
            .revoke(RevocationReason::Violated, Some(seq), now)
        {
            RevocationOutcome::Applied(record) => {
                state.declaration.status = record.status;
                Some(record)
            }
            RevocationOutcome::AlreadyTerminal(_) => None,
        }
    }

    /// Expire the intent if its window has closed and it is still active.
    fn expire_if_due(&self, state: &mut EngineState, now: i64) {
        if state.revocation.is_terminal() || !state.declaration.is_expired(now) {
            return;
        }
        if let RevocationOutcome::Applied(record) =
            state.revocation.revoke(RevocationReason::Expired, None, now)
        {
            state.declaration.status = record.status;
            tracing::info!(
                intent_id = %self.intent_id,
                expires_at = ?state.declaration.expires_at(),
                "intent expired"
            );
            self.emit_revocation(record);
        }
    }

    /// Mark the intent completed at the current time.
    pub fn mark_completed(&self) -> Result<RevocationRecord> {
        self.mark_completed_at(now_millis())
    }

    /// Mark the intent completed at `now`.
    ///
    /// Fails with `InvalidTransition` if the intent is already terminal,
    /// including when it expired before `now`.
    pub fn mark_completed_at(&self, now: i64) -> Result<RevocationRecord> {
        let mut guard = self.lock();
        let state = &mut *guard;
        self.expire_if_due(state, now);

        let record = state
            .revocation
            .transition(RevocationReason::Completed, None, now)?;
        state.declaration.status = record.status;
        tracing::info!(intent_id = %self.intent_id, "intent completed");
        self.emit_revocation(record.clone());
        Ok(record)
    }

    /// Revoke the intent manually at the current time.
    pub fn revoke(&self) -> RevocationOutcome {
        self.revoke_at(now_millis())
    }

    /// Revoke the intent manually at `now`.
    ///
    /// On an intent that is already terminal this changes nothing and
    /// returns the existing record.
    pub fn revoke_at(&self, now: i64) -> RevocationOutcome {
        let mut guard = self.lock();
        let state = &mut *guard;
        self.expire_if_due(state, now);

        let outcome = state
            .revocation
            .revoke(RevocationReason::Manual, None, now);
        if let RevocationOutcome::Applied(record) = &outcome {
            state.declaration.status = record.status;
            tracing::info!(intent_id = %self.intent_id, "intent revoked manually");
            self.emit_revocation(record.clone());
        }
        outcome
    }

    pub fn status(&self) -> IntentStatus {
        self.lock().revocation.status()
    }

    /// Status at `now`, expiring the intent if its window has closed.
    pub fn status_at(&self, now: i64) -> IntentStatus {
        let mut guard = self.lock();
        let state = &mut *guard;
        self.expire_if_due(state, now);
        state.revocation.status()
    }

    /// Retained history in sequence order.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().history.to_vec()
    }

    /// Retained history after sequence number `after`.
    pub fn history_since(&self, after: u64) -> Vec<HistoryEntry> {
        self.lock().history.since(after)
    }

    pub fn revocation(&self) -> Option<RevocationRecord> {
        self.lock().revocation.record().cloned()
    }

    pub fn ledger(&self) -> UsageLedger {
        self.lock().ledger.clone()
    }

    pub fn cumulative_drift(&self) -> f64 {
        self.lock().cumulative_drift
    }

    pub fn stats(&self) -> ValidationStats {
        self.lock().stats
    }

    pub fn drift_report(&self) -> DriftReport {
        let state = self.lock();
        DriftReport::assess(
            &self.detector,
            state.cumulative_drift,
            state.stats.blocked,
            self.config.repeated_violation_limit,
        )
    }

    /// Copy of the declaration with its current status.
    pub fn declaration(&self) -> IntentDeclaration {
        self.lock().declaration.clone()
    }

    fn emit_revocation(&self, record: RevocationRecord) {
        self.emit(AuditEvent::Revocation {
            intent_id: self.intent_id.clone(),
            record,
        });
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(sink) = &self.audit {
            sink.emit(&event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("intent_id", &self.intent_id)
            .field("status", &self.status())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

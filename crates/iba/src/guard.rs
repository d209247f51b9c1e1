//! Async validation with a caller-imposed deadline.
//!
//! The engine itself is synchronous. A slow [`PurposeDistance`] (for example
//! one backed by a model) would stall an async executor, so the guard runs
//! each validation on tokio's blocking pool and stops waiting once the
//! timeout elapses. A timed-out or failed validation is reported as a
//! denial, never as an allow.
//!
//! On timeout the guard cancels the validation's [`CancelToken`]. The engine
//! then records a `TimedOut` denial in place of its decision, so the ledger
//! and lifecycle are left as they were. If the engine decided first, the
//! cancel is refused and the guard waits for that decision instead.
//!
//! [`PurposeDistance`]: iba_engine::PurposeDistance

use std::sync::Arc;
use std::time::Duration;

use iba_engine::{ActionRequest, CancelToken, DenialReason, ValidationEngine, ValidationResult};

/// Cloneable async front end for a shared [`ValidationEngine`].
#[derive(Debug, Clone)]
pub struct IntentGuard {
    engine: Arc<ValidationEngine>,
}

impl IntentGuard {
    pub fn new(engine: ValidationEngine) -> Self {
        Self::from_arc(Arc::new(engine))
    }

    pub fn from_arc(engine: Arc<ValidationEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<ValidationEngine> {
        &self.engine
    }

    /// Validate `request`, giving up after `timeout`.
    pub async fn validate(&self, request: ActionRequest, timeout: Duration) -> ValidationResult {
        let engine = Arc::clone(&self.engine);
        let resource = request.resource.clone();
        let token = Arc::new(CancelToken::new());
        let engine_token = Arc::clone(&token);
        let mut task = tokio::task::spawn_blocking(move || {
            engine.validate_action_cancellable(request, &engine_token)
        });

        let joined = match tokio::time::timeout(timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                let after_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                if token.cancel(after_ms) {
                    tracing::warn!(
                        intent_id = %self.engine.intent_id(),
                        resource = %resource,
                        after_ms,
                        "validation timed out"
                    );
                    return denied(token.denial());
                }
                tracing::debug!(
                    intent_id = %self.engine.intent_id(),
                    resource = %resource,
                    after_ms,
                    "deadline passed after decision, waiting for result"
                );
                task.await
            }
        };

        joined.unwrap_or_else(|join_error| {
            tracing::error!(
                intent_id = %self.engine.intent_id(),
                resource = %resource,
                error = %join_error,
                "validation task failed"
            );
            denied(DenialReason::Internal {
                message: join_error.to_string(),
            })
        })
    }
}

/// The engine may still hold its lock, so the drift fields are zero.
fn denied(denial: DenialReason) -> ValidationResult {
    ValidationResult::denied(denial, 0.0, 0.0)
}

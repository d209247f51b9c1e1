//! Caller-side cancellation of a pending validation.
//!
//! A [`CancelToken`] is shared between a caller waiting on a deadline and
//! the engine doing the work. Exactly one side wins: either the engine
//! claims the token and its decision stands, or the caller cancels first
//! and the engine records a `TimedOut` denial with no other effect.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::action::DenialReason;

const PENDING: u8 = 0;
const DECIDED: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug, Default)]
pub struct CancelToken {
    state: AtomicU8,
    after_ms: AtomicU64,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel after waiting `after_ms`.
    ///
    /// Returns `false` if the engine already claimed the token; its decision
    /// then stands and the caller should wait for it.
    pub fn cancel(&self, after_ms: u64) -> bool {
        self.after_ms.store(after_ms, Ordering::Relaxed);
        self.state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Engine side: commit to a decision unless the caller cancelled first.
    pub(crate) fn claim(&self) -> bool {
        self.state
            .compare_exchange(PENDING, DECIDED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Denial recorded for a cancelled validation.
    pub fn denial(&self) -> DenialReason {
        DenialReason::TimedOut {
            after_ms: self.after_ms.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_before_claim() {
        let token = CancelToken::new();
        assert!(token.cancel(20));
        assert!(token.is_cancelled());
        assert!(!token.claim());
        assert_eq!(token.denial(), DenialReason::TimedOut { after_ms: 20 });
    }

    #[test]
    fn test_claim_before_cancel() {
        let token = CancelToken::new();
        assert!(token.claim());
        assert!(!token.cancel(20));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_claim_is_single_use() {
        let token = CancelToken::new();
        assert!(token.claim());
        assert!(!token.claim());
    }
}

//! Error types for the validation engine.
//!
//! Only construction and lifecycle calls fail with an [`EngineError`].
//! Denied actions are ordinary [`crate::ValidationResult`] values.

use iba_core::{CoreError, IntentStatus};
use thiserror::Error;

/// Errors that can occur while building or driving an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The declaration failed structural validation.
    #[error("malformed declaration: {0}")]
    MalformedDeclaration(String),

    /// The declaration's signature did not verify.
    #[error("intent signature is invalid")]
    SignatureInvalid,

    /// No public key is known for the issuing principal.
    #[error("unknown principal: {0}")]
    UnknownPrincipal(String),

    /// The engine configuration is out of range.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// A lifecycle call was made from a state that does not allow it.
    #[error("invalid transition: cannot {event} an intent that is {from}")]
    InvalidTransition {
        from: IntentStatus,
        event: &'static str,
    },

    /// Other core error.
    #[error("core error: {0}")]
    Core(CoreError),
}

impl From<CoreError> for EngineError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MalformedDeclaration(msg) => EngineError::MalformedDeclaration(msg),
            CoreError::InvalidPattern { .. } => EngineError::MalformedDeclaration(e.to_string()),
            CoreError::SignatureInvalid | CoreError::InvalidPublicKey => {
                EngineError::SignatureInvalid
            }
            other => EngineError::Core(other),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

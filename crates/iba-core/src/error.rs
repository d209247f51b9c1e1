//! Error types for the intent-bound authorization core.

use thiserror::Error;

/// Core errors that can occur while building, encoding, or verifying intents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("malformed declaration: {0}")]
    MalformedDeclaration(String),

    #[error("invalid resource pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid signature")]
    SignatureInvalid,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

impl CoreError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        CoreError::MalformedDeclaration(msg.into())
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        CoreError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

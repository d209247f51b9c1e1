//! Error types for the facade.

use iba_core::CoreError;
use iba_engine::EngineError;
use thiserror::Error;

/// Errors that can occur during facade operations.
#[derive(Debug, Error)]
pub enum IbaError {
    /// Intent construction or encoding error.
    #[error("intent error: {0}")]
    Core(#[from] CoreError),

    /// Engine construction or lifecycle error.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// An authority was asked to sign for another principal.
    #[error("authority {authority} cannot sign for {authorized_by}")]
    PrincipalMismatch {
        authority: String,
        authorized_by: String,
    },
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, IbaError>;

//! Engine error types

use thiserror::Error;

/// Errors surfaced by the engine's fallible operations.
///
/// Estimation never fails (it falls back internally); only input validation
/// does, so submissions can be rejected before a job starts.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> EngineError {
        EngineError::Validation(msg.into())
    }
}

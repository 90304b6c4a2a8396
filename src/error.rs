use std::time::Duration;
use thiserror::Error;

/// Errors surfaced at the engine boundary.
///
/// Every failure mode is recovered into one of these values; nothing in the
/// engine is allowed to take down the hosting process.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The submitted source is empty or otherwise unusable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The sentinel frame was missing or malformed. This is a contract
    /// violation between the instrumenter and the parser, not a user error.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The interpreter subprocess exceeded its wall-clock budget.
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    /// The executed script raised; carries the script's own message.
    #[error("Runtime error: {message}")]
    Runtime {
        message: String,
        traceback: String,
    },

    /// The interpreter crashed before the instrumented error handling could
    /// run (for example a syntax error in the submitted source).
    #[error("Interpreter error: {0}")]
    Interpreter(String),

    /// The requested operation is invalid for the session's current state.
    #[error("Session error: {0}")]
    Session(String),

    /// No session exists with the given id.
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Process error: {0}")]
    Process(#[from] crate::subprocess::ProcessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Message shown to the session owner when this error ends a step.
    pub fn step_message(&self) -> String {
        match self {
            EngineError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

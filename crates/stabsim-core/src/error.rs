//! Unified error types for the stabsim workspace
//!
//! [`StabError`] carries the failure taxonomy of a batch: configuration problems
//! (unresolvable case/disturbance combinations, missing case inputs) and host-level engine
//! faults. Both are terminal for one (case, contingency) pair only; the batch orchestrator logs
//! them and moves on.
//!
//! A non-converged or numerically failed simulation is *not* an error. It is an
//! [`EngineOutcome`](crate::EngineOutcome) and its data is still reduced and exported.

use thiserror::Error;

/// Unified error type for stabsim operations.
#[derive(Error, Debug)]
pub enum StabError {
    /// Unresolvable case/disturbance combination, missing case inputs, bad suite settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Host-level fault while driving the engine command sequence
    #[error("Engine runtime fault: {0}")]
    EngineRuntime(String),

    /// I/O errors (case discovery, artifact writing)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl StabError {
    /// True for errors that mean "this pair was never runnable" rather than "the run broke".
    pub fn is_configuration(&self) -> bool {
        matches!(self, StabError::Configuration(_))
    }
}

/// Convenience type alias for Results using StabError.
pub type StabResult<T> = Result<T, StabError>;

impl From<anyhow::Error> for StabError {
    fn from(err: anyhow::Error) -> Self {
        StabError::Other(format!("{err:#}"))
    }
}

impl From<String> for StabError {
    fn from(s: String) -> Self {
        StabError::Other(s)
    }
}

impl From<&str> for StabError {
    fn from(s: &str) -> Self {
        StabError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for StabError {
    fn from(err: serde_json::Error) -> Self {
        StabError::Parse(err.to_string())
    }
}

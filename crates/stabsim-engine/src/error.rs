//! Host-level engine faults.
//!
//! A fault means the command sequence could not be carried out at all (the bridge died, a pipe
//! broke, the engine raised). That is different from a non-zero [`EngineStatus`], which is
//! only recorded.
//!
//! [`EngineStatus`]: crate::EngineStatus

use stabsim_core::StabError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineFault {
    /// Bridge program could not be started.
    #[error("Failed to start engine bridge '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the bridge failed.
    #[error("Engine bridge I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Bridge answered with something that is not a valid response.
    #[error("Engine bridge protocol error: {0}")]
    Protocol(String),

    /// Bridge closed its output before answering.
    #[error("Engine bridge exited unexpectedly ({status})")]
    BridgeExited { status: String },

    /// Command issued before `open()` or after `close()`.
    #[error("Engine session is not open")]
    NotOpen,

    /// No channel output file at the requested location.
    #[error("No channel output at '{}'", .0.display())]
    MissingOutput(PathBuf),

    /// The engine raised while executing a command.
    #[error("Engine raised during {command}: {message}")]
    Host { command: String, message: String },
}

impl From<EngineFault> for StabError {
    fn from(fault: EngineFault) -> Self {
        StabError::EngineRuntime(fault.to_string())
    }
}

impl From<serde_json::Error> for EngineFault {
    fn from(err: serde_json::Error) -> Self {
        EngineFault::Protocol(err.to_string())
    }
}

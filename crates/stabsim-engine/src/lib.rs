//! Engine session contract and backends.
//!
//! The simulation engine is an opaque, blocking, stateful command interface. This crate pins
//! that interface down as the [`EngineSession`] trait and ships two backends:
//!
//! - [`BridgeEngine`] drives an external bridge process (the host of the vendor engine) over
//!   line-delimited JSON on stdin/stdout.
//! - [`ScriptedEngine`] is a deterministic in-process engine for dry runs and tests.
//!
//! Every command answers with an [`EngineStatus`]. Status codes are recorded, never acted on:
//! the engine's free-text diagnostics are the authoritative failure signal, and they are
//! collected through a scoped [`DiagnosticCapture`].

pub mod bridge;
pub mod capture;
pub mod error;
pub mod protocol;
pub mod scripted;
pub mod session;

pub use bridge::{BridgeConfig, BridgeEngine};
pub use capture::{DiagnosticBuffer, DiagnosticCapture};
pub use error::EngineFault;
pub use protocol::{BridgeRequest, BridgeResponse};
pub use scripted::{ScriptedEngine, ScriptedNetwork};
pub use session::{
    ConversionStep, EngineCommand, EngineResult, EngineSession, EngineStatus, LoadConversion,
    PowerFlowOptions,
};

//! Simulation run driver.
//!
//! One run is a fixed sequence of engine commands: load and solve the base case, prepare the
//! dynamic models, configure channels, then hand over to the [`DisturbanceController`] for the
//! timed part of the run. The whole sequence executes inside a single diagnostic capture and the
//! captured text is classified by the [`OutputClassifier`] afterwards.
//!
//! Status codes are collected in a [`StatusLog`] and never stop the sequence; only host faults
//! do.

pub mod classify;
pub mod disturbance;
pub mod driver;
pub mod status;

pub use classify::OutputClassifier;
pub use disturbance::{ControllerState, DisturbanceController, DisturbanceTiming};
pub use driver::{RawRun, RunDriver, RunOptions};
pub use status::{StatusLog, StatusRecord};

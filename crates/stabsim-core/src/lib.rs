//! # stabsim-core: Transient-Stability Batch Modeling Core
//!
//! Shared data structures for driving batches of dynamic (transient-stability) simulations
//! against an external simulation engine and reducing its channel output.
//!
//! ## Design Philosophy
//!
//! The engine itself is opaque. Everything this crate models is what the batch tooling knows
//! *about* a run before and after the engine sees it:
//! - **Cases**: a directory with a base case, optional dynamics data and the run parameters
//! - **Contingencies**: a named disturbance resolved from `(case, disturbance type)`
//! - **Channels**: raw labelled sample vectors read back from the engine's output file
//! - **Outcomes**: a verdict derived from the engine's free-text diagnostics
//!
//! ## Quick Start
//!
//! ```rust
//! use stabsim_core::*;
//!
//! let registry = ContingencyRegistry::builtin();
//! let resolved = registry.resolve("case_NRE", DisturbanceKind::LineFault);
//! assert_eq!(resolved.name, "line_trip_5-7");
//! assert!(matches!(
//!     resolved.disturbance,
//!     Some(DisturbanceSpec::BranchTrip { .. })
//! ));
//! ```
//!
//! ## Core Data Structures
//!
//! - [`SimulationCase`] - immutable description of one run attempt
//! - [`DisturbanceSpec`] - closed variant over the supported disturbance kinds
//! - [`ContingencyRegistry`] - `(case, kind)` lookup with an explicit unknown sentinel
//! - [`EngineOutcome`] - text-classified verdict of one run
//! - [`ChannelDump`] - raw channel labels and samples, time channel first
//! - [`ArtifactNaming`] - file and directory naming for everything a run produces

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod case;
pub mod channel;
pub mod contingency;
pub mod disturbance;
pub mod error;
pub mod naming;
pub mod outcome;
pub mod units;

pub use case::{BaseCase, ChannelMode, ChannelQuantity, DisturbanceKind, SimulationCase};
pub use channel::{ChannelDump, ChannelSample, SignalKind};
pub use contingency::{
    CaseMatch, ContingencyRegistry, RegistryEntry, ResolvedContingency, UNKNOWN_CONTINGENCY,
};
pub use disturbance::{DisturbanceSpec, FaultImpedance, FaultUnits};
pub use error::{StabError, StabResult};
pub use naming::ArtifactNaming;
pub use outcome::EngineOutcome;
pub use units::{Kilovolts, Megawatts, Seconds};

/// Bus number as used by the engine's network model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(u32);

impl BusId {
    #[inline]
    pub fn new(value: u32) -> Self {
        BusId(value)
    }
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BusId {
    fn from(value: u32) -> Self {
        BusId(value)
    }
}

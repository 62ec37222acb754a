//! Timed part of a run: settle, disturb, optionally clear, run out.
//!
//! ```text
//! Idle --advance(settle)--> PreRun --apply--> Applied --advance(clear), clear--> Cleared
//!                             |                  |                                  |
//!                             | unresolved       | setpoint change                  |
//!                             v                  v                                  v
//!                           PostRun <------------+------ redirect, advance(runtime) +
//!                             |
//!                             +--delete channels--> Done
//! ```
//!
//! The engine can drop its channel-output association during a disturbance operation, so the
//! output file is re-asserted after every disturbance and again before the final run-out.

use serde::{Deserialize, Serialize};
use stabsim_core::{DisturbanceSpec, Seconds, SimulationCase, StabError, StabResult};
use stabsim_engine::{EngineFault, EngineSession};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::status::StatusLog;

/// Fault index passed to the clear command; only one fault is ever active.
const FAULT_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    PreRun,
    Applied,
    Cleared,
    PostRun,
    Done,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Idle => "idle",
            ControllerState::PreRun => "pre_run",
            ControllerState::Applied => "applied",
            ControllerState::Cleared => "cleared",
            ControllerState::PostRun => "post_run",
            ControllerState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Fixed points in time of the disturbance sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisturbanceTiming {
    /// End of the steady-state settling window
    pub settle_time: Seconds,
    /// End of the fault window for fault-type disturbances (about 10 cycles at 60 Hz)
    pub fault_clear_time: Seconds,
}

impl Default for DisturbanceTiming {
    fn default() -> Self {
        Self {
            settle_time: Seconds(1.0),
            fault_clear_time: Seconds(1.17),
        }
    }
}

impl DisturbanceTiming {
    /// Times must be strictly increasing up to the run's end.
    pub fn check(&self, runtime: Seconds) -> StabResult<()> {
        if self.settle_time.value() <= 0.0 {
            return Err(StabError::Configuration(format!(
                "settle_time must be positive, got {}",
                self.settle_time
            )));
        }
        if self.fault_clear_time <= self.settle_time {
            return Err(StabError::Configuration(format!(
                "fault_clear_time ({}) must be after settle_time ({})",
                self.fault_clear_time, self.settle_time
            )));
        }
        if runtime <= self.fault_clear_time {
            return Err(StabError::Configuration(format!(
                "runtime ({runtime}) must be after fault_clear_time ({})",
                self.fault_clear_time
            )));
        }
        Ok(())
    }
}

pub struct DisturbanceController<'a> {
    timing: DisturbanceTiming,
    output: &'a Path,
    state: ControllerState,
    transitions: Vec<ControllerState>,
    issue: Option<StabError>,
}

impl<'a> DisturbanceController<'a> {
    /// `output` is the channel file the run was started with.
    pub fn new(timing: DisturbanceTiming, output: &'a Path) -> Self {
        Self {
            timing,
            output,
            state: ControllerState::Idle,
            transitions: vec![ControllerState::Idle],
            issue: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Every state entered, starting with `Idle`.
    pub fn transitions(&self) -> &[ControllerState] {
        &self.transitions
    }

    /// Configuration problem hit while resolving the disturbance, if any.
    pub fn issue(&self) -> Option<&StabError> {
        self.issue.as_ref()
    }

    pub fn into_issue(self) -> Option<StabError> {
        self.issue
    }

    /// Drives the engine from `Idle` to `Done`.
    ///
    /// `disturbance` is `None` when the registry has no parameters for the case; the run then
    /// skips straight to the run-out and the problem is kept as [`issue`](Self::issue).
    pub fn run<E: EngineSession + ?Sized>(
        &mut self,
        engine: &mut E,
        case: &SimulationCase,
        disturbance: Option<&DisturbanceSpec>,
        statuses: &mut StatusLog,
    ) -> Result<(), EngineFault> {
        while self.state != ControllerState::Done {
            let next = self.step(engine, case, disturbance, statuses)?;
            debug!(case = %case.name, from = %self.state, to = %next, "Disturbance controller transition");
            self.state = next;
            self.transitions.push(next);
        }
        Ok(())
    }

    fn step<E: EngineSession + ?Sized>(
        &mut self,
        engine: &mut E,
        case: &SimulationCase,
        disturbance: Option<&DisturbanceSpec>,
        statuses: &mut StatusLog,
    ) -> Result<ControllerState, EngineFault> {
        match (self.state, disturbance) {
            (ControllerState::Idle, _) => {
                statuses.record("advance", engine.advance(self.timing.settle_time))?;
                Ok(ControllerState::PreRun)
            }
            (ControllerState::PreRun, None) => {
                let issue = StabError::Configuration(format!(
                    "no disturbance parameters for case '{}' and type '{}'",
                    case.name, case.disturbance
                ));
                warn!(case = %case.name, disturbance = %case.disturbance, "{issue}; running without disturbance");
                self.issue = Some(issue);
                self.run_out(engine, case, statuses)?;
                Ok(ControllerState::PostRun)
            }
            (ControllerState::PreRun, Some(spec)) => {
                self.apply(engine, spec, statuses)?;
                statuses.record(
                    "redirect_channel_output",
                    engine.redirect_channel_output(self.output),
                )?;
                Ok(ControllerState::Applied)
            }
            (ControllerState::Applied, Some(spec)) if spec.is_fault_type() => {
                statuses.record("advance", engine.advance(self.timing.fault_clear_time))?;
                statuses.record("clear_fault", engine.clear_fault(FAULT_ID))?;
                Ok(ControllerState::Cleared)
            }
            (ControllerState::Applied, _) | (ControllerState::Cleared, _) => {
                self.run_out(engine, case, statuses)?;
                Ok(ControllerState::PostRun)
            }
            (ControllerState::PostRun, _) => {
                statuses.record("delete_channels", engine.delete_channels())?;
                Ok(ControllerState::Done)
            }
            (ControllerState::Done, _) => Ok(ControllerState::Done),
        }
    }

    fn apply<E: EngineSession + ?Sized>(
        &self,
        engine: &mut E,
        spec: &DisturbanceSpec,
        statuses: &mut StatusLog,
    ) -> Result<(), EngineFault> {
        debug!(disturbance = %spec, "Applying disturbance");
        match spec {
            DisturbanceSpec::BranchFault {
                from_bus,
                to_bus,
                circuit,
                base_kv,
                impedance,
            } => statuses.record(
                "apply_branch_fault",
                engine.apply_branch_fault(*from_bus, *to_bus, circuit, *base_kv, *impedance),
            ),
            DisturbanceSpec::BranchTrip {
                from_bus,
                to_bus,
                circuit,
            } => statuses.record(
                "trip_branch",
                engine.trip_branch(*from_bus, *to_bus, circuit),
            ),
            DisturbanceSpec::GeneratorSetpoint {
                bus,
                machine,
                active_power,
            } => statuses.record(
                "change_machine_power",
                engine.change_machine_power(*bus, machine, *active_power),
            ),
        }
    }

    fn run_out<E: EngineSession + ?Sized>(
        &self,
        engine: &mut E,
        case: &SimulationCase,
        statuses: &mut StatusLog,
    ) -> Result<(), EngineFault> {
        statuses.record(
            "redirect_channel_output",
            engine.redirect_channel_output(self.output),
        )?;
        statuses.record("advance", engine.advance(case.runtime))
    }
}

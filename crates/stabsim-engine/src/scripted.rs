//! Deterministic in-process engine.
//!
//! `ScriptedEngine` follows the engine's command protocol closely enough to exercise the whole
//! batch pipeline without the vendor engine: it synthesizes channel labels in the engine's own
//! label format, records samples on a fixed time step, and writes the diagnostic lines the
//! classifier looks for. Tests steer it with per-command output, status and fault injection.
//!
//! ```
//! use stabsim_core::{ChannelQuantity, Seconds};
//! use stabsim_engine::{EngineSession, ScriptedEngine};
//! use std::path::Path;
//!
//! let mut engine = ScriptedEngine::new();
//! engine.open().unwrap();
//! engine.configure_channels(&[ChannelQuantity::BusVoltage]).unwrap();
//! engine.start_dynamic_run(Path::new("run.outx")).unwrap();
//! engine.advance(Seconds(0.05)).unwrap();
//! engine.delete_channels().unwrap();
//!
//! let dump = engine.read_channels(Path::new("run.outx")).unwrap();
//! assert_eq!(dump.labels[1], "VOLT 1[BUS1 230.000]");
//! assert_eq!(dump.time().last(), Some(&0.05));
//! ```

use stabsim_core::{BusId, ChannelDump, ChannelQuantity, Kilovolts, Megawatts, Seconds};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::capture::DiagnosticBuffer;
use crate::error::EngineFault;
use crate::session::{EngineCommand, EngineResult, EngineSession, EngineStatus};

const TIME_LABEL: &str = "Time(s)";
const EPSILON: f64 = 1e-9;

/// Network the scripted engine pretends to have loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedNetwork {
    pub buses: Vec<BusId>,
    pub machine_buses: Vec<BusId>,
    pub base_kv: Kilovolts,
}

impl Default for ScriptedNetwork {
    fn default() -> Self {
        Self {
            buses: (1..=9).map(BusId::new).collect(),
            machine_buses: [1, 2, 3].into_iter().map(BusId::new).collect(),
            base_kv: Kilovolts(230.0),
        }
    }
}

#[derive(Debug, Clone)]
struct CaseInjection {
    case_fragment: String,
    op: String,
    output: String,
}

#[derive(Debug, Default)]
struct RunState {
    case: Option<PathBuf>,
    quantities: Vec<ChannelQuantity>,
    target: Option<PathBuf>,
    recording: Option<ChannelDump>,
    time: f64,
    fault_active: bool,
    disturbed_at: Option<f64>,
    setpoints: HashMap<BusId, f64>,
}

pub struct ScriptedEngine {
    network: ScriptedNetwork,
    time_step: f64,
    diagnostics: DiagnosticBuffer,
    is_open: bool,
    opens: usize,
    calls: Vec<EngineCommand>,
    reads: Vec<PathBuf>,
    outputs: HashMap<PathBuf, ChannelDump>,
    injected_output: HashMap<String, String>,
    case_output: Vec<CaseInjection>,
    statuses: HashMap<String, i32>,
    failures: HashSet<String>,
    failing_cases: Vec<String>,
    state: RunState,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::with_network(ScriptedNetwork::default())
    }

    pub fn with_network(network: ScriptedNetwork) -> Self {
        Self {
            network,
            time_step: 0.01,
            diagnostics: DiagnosticBuffer::new(),
            is_open: false,
            opens: 0,
            calls: Vec::new(),
            reads: Vec::new(),
            outputs: HashMap::new(),
            injected_output: HashMap::new(),
            case_output: Vec::new(),
            statuses: HashMap::new(),
            failures: HashSet::new(),
            failing_cases: Vec::new(),
            state: RunState::default(),
        }
    }

    pub fn time_step(mut self, step: Seconds) -> Self {
        self.time_step = step.value();
        self
    }

    /// Extra text written whenever `op` executes.
    pub fn inject_output(mut self, op: &str, text: &str) -> Self {
        self.injected_output.insert(op.to_string(), text.to_string());
        self
    }

    /// Extra text written when `op` executes while a case whose path contains `case_fragment`
    /// is loaded.
    pub fn inject_case_output(mut self, case_fragment: &str, op: &str, text: &str) -> Self {
        self.case_output.push(CaseInjection {
            case_fragment: case_fragment.to_string(),
            op: op.to_string(),
            output: text.to_string(),
        });
        self
    }

    /// Status code returned for `op` instead of the computed one.
    pub fn with_status(mut self, op: &str, code: i32) -> Self {
        self.statuses.insert(op.to_string(), code);
        self
    }

    /// Makes `op` raise a host fault.
    pub fn fail_on(mut self, op: &str) -> Self {
        self.failures.insert(op.to_string());
        self
    }

    /// Makes loading any case whose path contains `case_fragment` raise a host fault.
    pub fn fail_loading(mut self, case_fragment: &str) -> Self {
        self.failing_cases.push(case_fragment.to_string());
        self
    }

    /// Every command executed so far, across resets.
    pub fn calls(&self) -> &[EngineCommand] {
        &self.calls
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.calls.iter().map(EngineCommand::op).collect()
    }

    pub fn advance_times(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCommand::Advance { to } => Some(to.value()),
                _ => None,
            })
            .collect()
    }

    /// Output paths passed to `read_channels`.
    pub fn reads(&self) -> &[PathBuf] {
        &self.reads
    }

    pub fn open_count(&self) -> usize {
        self.opens
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    fn case_matches(&self, fragment: &str) -> bool {
        self.state
            .case
            .as_ref()
            .is_some_and(|case| case.to_string_lossy().contains(fragment))
    }

    fn labels(&self) -> Vec<String> {
        let kv = self.network.base_kv.value();
        let mut labels = vec![TIME_LABEL.to_string()];
        for quantity in &self.state.quantities {
            match quantity {
                ChannelQuantity::MachinePower => labels.extend(
                    self.network
                        .machine_buses
                        .iter()
                        .map(|bus| format!("POWR {bus}[BUS{bus} {kv:.3}]1")),
                ),
                ChannelQuantity::BusFrequency => labels.extend(
                    self.network
                        .buses
                        .iter()
                        .map(|bus| format!("FREQ {bus}[BUS{bus} {kv:.3}]")),
                ),
                ChannelQuantity::BusVoltage => labels.extend(
                    self.network
                        .buses
                        .iter()
                        .map(|bus| format!("VOLT {bus}[BUS{bus} {kv:.3}]")),
                ),
                ChannelQuantity::MachineSpeed => labels.extend(
                    self.network
                        .machine_buses
                        .iter()
                        .map(|bus| format!("SPD {bus}[BUS{bus} {kv:.3}]1")),
                ),
            }
        }
        labels
    }

    /// Appends one sample row at time `t` to the active recording.
    fn record(&mut self, t: f64) {
        let swing = self
            .state
            .disturbed_at
            .map(|t0| (-(t - t0)).exp() * (6.0 * (t - t0)).sin())
            .unwrap_or(0.0);
        let mut row = vec![t];
        for quantity in &self.state.quantities {
            match quantity {
                ChannelQuantity::MachinePower => {
                    for (idx, bus) in self.network.machine_buses.iter().enumerate() {
                        let base = self
                            .state
                            .setpoints
                            .get(bus)
                            .copied()
                            .unwrap_or(70.0 + 50.0 * idx as f64);
                        row.push(base + 5.0 * swing);
                    }
                }
                ChannelQuantity::BusFrequency => {
                    row.extend(self.network.buses.iter().map(|_| 0.001 * swing));
                }
                ChannelQuantity::BusVoltage => {
                    let sag = if self.state.fault_active { 0.8 } else { 0.0 };
                    row.extend(self.network.buses.iter().map(|_| 1.0 - sag + 0.01 * swing));
                }
                ChannelQuantity::MachineSpeed => {
                    row.extend(self.network.machine_buses.iter().map(|_| 0.002 * swing));
                }
            }
        }

        if let Some(dump) = self.state.recording.as_mut() {
            for (column, value) in dump.samples.iter_mut().zip(row) {
                column.push(value);
            }
        }
    }

    fn flush_recording(&mut self) {
        if let (Some(target), Some(dump)) = (self.state.target.clone(), self.state.recording.take())
        {
            trace!(output = %target.display(), samples = dump.time().len(), "Scripted recording flushed");
            self.outputs.insert(target, dump);
        }
    }

    /// A freshly loaded network has no disturbance and no setpoint changes.
    fn load_network(&mut self, path: &Path) {
        self.state.case = Some(path.to_path_buf());
        self.state.fault_active = false;
        self.state.disturbed_at = None;
        self.state.setpoints.clear();
    }

    fn run_command(&mut self, command: &EngineCommand) -> (i32, String) {
        match command {
            EngineCommand::Initialize { capacity } => {
                self.flush_recording();
                self.state = RunState::default();
                (
                    0,
                    format!("Scripted engine initialized for {capacity} buses"),
                )
            }
            EngineCommand::LoadCase { path } => {
                self.load_network(path);
                if path.exists() {
                    (0, format!("Case loaded from {}", path.display()))
                } else {
                    (3, format!("File {} not found", path.display()))
                }
            }
            EngineCommand::ReadRaw { path } => {
                self.load_network(path);
                if path.exists() {
                    (0, format!("Reading raw data from {}", path.display()))
                } else {
                    (3, format!("File {} not found", path.display()))
                }
            }
            EngineCommand::SaveCase { path } => {
                match std::fs::write(path, "scripted saved case\n") {
                    Ok(()) => (0, format!("Case saved to {}", path.display())),
                    Err(err) => (1, format!("Unable to save case {}: {err}", path.display())),
                }
            }
            EngineCommand::SolvePowerFlow { .. } => {
                (0, "Reached tolerance in 3 iterations".to_string())
            }
            EngineCommand::ConvertGenerators => (0, "Generators converted".to_string()),
            EngineCommand::ConvertLoads { conversion } => {
                (0, format!("Load conversion step {:?} done", conversion.step))
            }
            EngineCommand::FactorizeNetwork => (0, "Network factorized".to_string()),
            EngineCommand::LoadDynamics { path } => {
                if path.exists() {
                    (0, format!("Dynamics data read from {}", path.display()))
                } else {
                    (3, format!("File {} not found", path.display()))
                }
            }
            EngineCommand::DeleteChannels => {
                self.flush_recording();
                self.state.quantities.clear();
                (0, String::new())
            }
            EngineCommand::ConfigureChannels { quantities } => {
                for quantity in quantities {
                    if !self.state.quantities.contains(quantity) {
                        self.state.quantities.push(*quantity);
                    }
                }
                (0, String::new())
            }
            EngineCommand::StartDynamicRun { output } => {
                let labels = self.labels();
                let samples = vec![Vec::new(); labels.len()];
                self.state.target = Some(output.clone());
                self.state.recording = Some(ChannelDump {
                    title: "SCRIPTED ENGINE".to_string(),
                    labels,
                    samples,
                });
                self.state.time = 0.0;
                self.record(0.0);
                (0, "INITIAL CONDITIONS CHECK O.K.".to_string())
            }
            EngineCommand::RedirectChannelOutput { output } => {
                self.state.target = Some(output.clone());
                (0, String::new())
            }
            EngineCommand::Advance { to } => {
                if self.state.recording.is_none() {
                    return (1, "Dynamic run has not been initialized".to_string());
                }
                let to = to.value();
                while self.state.time < to - EPSILON {
                    let mut next = self.state.time + self.time_step;
                    if next > to - EPSILON {
                        next = to;
                    }
                    self.state.time = next;
                    self.record(next);
                }
                (0, format!("Simulation advanced to {to:.4} s"))
            }
            EngineCommand::ApplyBranchFault {
                from_bus, to_bus, ..
            } => {
                self.state.fault_active = true;
                self.state.disturbed_at = Some(self.state.time);
                (0, format!("Fault applied on branch {from_bus}-{to_bus}"))
            }
            EngineCommand::TripBranch {
                from_bus,
                to_bus,
                circuit,
            } => {
                self.state.disturbed_at = Some(self.state.time);
                (
                    0,
                    format!("Branch {from_bus}-{to_bus} circuit {circuit} tripped"),
                )
            }
            EngineCommand::ChangeMachinePower {
                bus,
                machine,
                active_power,
            } => {
                let Megawatts(pg) = *active_power;
                self.state.setpoints.insert(*bus, pg);
                self.state.disturbed_at = Some(self.state.time);
                (0, format!("Machine {machine} at bus {bus} set to {active_power}"))
            }
            EngineCommand::ClearFault { fault_id } => {
                if self.state.fault_active {
                    self.state.fault_active = false;
                    (0, format!("Fault {fault_id} cleared"))
                } else {
                    (1, format!("No fault {fault_id} to clear"))
                }
            }
        }
    }
}

impl EngineSession for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn open(&mut self) -> Result<(), EngineFault> {
        if !self.is_open {
            self.is_open = true;
            self.opens += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), EngineFault> {
        self.is_open = false;
        self.state = RunState::default();
        Ok(())
    }

    fn diagnostics_mut(&mut self) -> &mut DiagnosticBuffer {
        &mut self.diagnostics
    }

    fn execute(&mut self, command: &EngineCommand) -> EngineResult {
        if !self.is_open {
            return Err(EngineFault::NotOpen);
        }
        let op = command.op();
        self.calls.push(command.clone());

        if self.failures.contains(op) {
            return Err(EngineFault::Host {
                command: op.to_string(),
                message: "scripted failure".to_string(),
            });
        }
        if let EngineCommand::LoadCase { path } = command {
            let path = path.to_string_lossy();
            if self.failing_cases.iter().any(|frag| path.contains(frag.as_str())) {
                return Err(EngineFault::Host {
                    command: op.to_string(),
                    message: format!("scripted failure loading {path}"),
                });
            }
        }

        let (code, text) = self.run_command(command);
        self.diagnostics.emit(&text);
        if let Some(extra) = self.injected_output.get(op) {
            self.diagnostics.emit(extra);
        }
        let case_extras: Vec<String> = self
            .case_output
            .iter()
            .filter(|inj| inj.op == op && self.case_matches(&inj.case_fragment))
            .map(|inj| inj.output.clone())
            .collect();
        for extra in case_extras {
            self.diagnostics.emit(&extra);
        }

        let code = self.statuses.get(op).copied().unwrap_or(code);
        Ok(EngineStatus(code))
    }

    fn read_channels(&mut self, output: &Path) -> Result<stabsim_core::ChannelDump, EngineFault> {
        if !self.is_open {
            return Err(EngineFault::NotOpen);
        }
        self.reads.push(output.to_path_buf());
        if self.failures.contains("read_channels") {
            return Err(EngineFault::Host {
                command: "read_channels".to_string(),
                message: "scripted failure".to_string(),
            });
        }
        self.outputs
            .get(output)
            .cloned()
            .ok_or_else(|| EngineFault::MissingOutput(output.to_path_buf()))
    }
}

use serde::{Deserialize, Serialize};
use stabsim_core::{BusId, ChannelDump, ChannelQuantity, FaultImpedance, Kilovolts, Megawatts, Seconds};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::capture::DiagnosticBuffer;
use crate::error::EngineFault;

/// Status code returned by every engine command. Zero means the engine reported success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineStatus(pub i32);

impl EngineStatus {
    pub const OK: EngineStatus = EngineStatus(0);

    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    pub fn code(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type EngineResult = Result<EngineStatus, EngineFault>;

/// Full Newton-Raphson power-flow options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerFlowOptions {
    pub tap_adjustment: i32,
    pub area_interchange: i32,
    pub phase_shift_adjustment: i32,
    pub dc_tap_adjustment: i32,
    pub switched_shunt_adjustment: i32,
    pub flat_start: bool,
    /// Iteration at which reactive limits apply; 99 applies them immediately
    pub var_limits: i32,
    pub non_divergent: bool,
}

impl Default for PowerFlowOptions {
    fn default() -> Self {
        Self {
            tap_adjustment: 0,
            area_interchange: 0,
            phase_shift_adjustment: 0,
            dc_tap_adjustment: 1,
            switched_shunt_adjustment: 1,
            flat_start: false,
            var_limits: 99,
            non_divergent: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStep {
    Initialize,
    Convert,
    Finish,
}

impl ConversionStep {
    pub const SEQUENCE: [ConversionStep; 3] = [
        ConversionStep::Initialize,
        ConversionStep::Convert,
        ConversionStep::Finish,
    ];
}

/// Load model conversion. Percentages split each load between constant current and constant
/// admittance; whatever is left stays constant power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadConversion {
    pub step: ConversionStep,
    pub active_current_pct: f64,
    pub active_admittance_pct: f64,
    pub reactive_current_pct: f64,
    pub reactive_admittance_pct: f64,
}

impl LoadConversion {
    /// All loads to constant impedance.
    pub fn constant_impedance(step: ConversionStep) -> Self {
        Self {
            step,
            active_current_pct: 0.0,
            active_admittance_pct: 100.0,
            reactive_current_pct: 0.0,
            reactive_admittance_pct: 100.0,
        }
    }
}

/// One engine command. This is also the request payload of the bridge protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EngineCommand {
    Initialize {
        capacity: u32,
    },
    LoadCase {
        path: PathBuf,
    },
    ReadRaw {
        path: PathBuf,
    },
    SaveCase {
        path: PathBuf,
    },
    SolvePowerFlow {
        options: PowerFlowOptions,
    },
    ConvertGenerators,
    ConvertLoads {
        conversion: LoadConversion,
    },
    /// Network ordering, factorization and switching-study solution
    FactorizeNetwork,
    LoadDynamics {
        path: PathBuf,
    },
    DeleteChannels,
    ConfigureChannels {
        quantities: Vec<ChannelQuantity>,
    },
    StartDynamicRun {
        output: PathBuf,
    },
    RedirectChannelOutput {
        output: PathBuf,
    },
    Advance {
        to: Seconds,
    },
    ApplyBranchFault {
        from_bus: BusId,
        to_bus: BusId,
        circuit: String,
        base_kv: Kilovolts,
        impedance: FaultImpedance,
    },
    TripBranch {
        from_bus: BusId,
        to_bus: BusId,
        circuit: String,
    },
    /// Only the active-power setpoint is sent; the engine keeps its defaults for the rest
    ChangeMachinePower {
        bus: BusId,
        machine: String,
        active_power: Megawatts,
    },
    ClearFault {
        fault_id: u32,
    },
}

impl EngineCommand {
    /// Stable operation name, matching the protocol `op` tag.
    pub fn op(&self) -> &'static str {
        match self {
            EngineCommand::Initialize { .. } => "initialize",
            EngineCommand::LoadCase { .. } => "load_case",
            EngineCommand::ReadRaw { .. } => "read_raw",
            EngineCommand::SaveCase { .. } => "save_case",
            EngineCommand::SolvePowerFlow { .. } => "solve_power_flow",
            EngineCommand::ConvertGenerators => "convert_generators",
            EngineCommand::ConvertLoads { .. } => "convert_loads",
            EngineCommand::FactorizeNetwork => "factorize_network",
            EngineCommand::LoadDynamics { .. } => "load_dynamics",
            EngineCommand::DeleteChannels => "delete_channels",
            EngineCommand::ConfigureChannels { .. } => "configure_channels",
            EngineCommand::StartDynamicRun { .. } => "start_dynamic_run",
            EngineCommand::RedirectChannelOutput { .. } => "redirect_channel_output",
            EngineCommand::Advance { .. } => "advance",
            EngineCommand::ApplyBranchFault { .. } => "apply_branch_fault",
            EngineCommand::TripBranch { .. } => "trip_branch",
            EngineCommand::ChangeMachinePower { .. } => "change_machine_power",
            EngineCommand::ClearFault { .. } => "clear_fault",
        }
    }
}

/// Handle to a simulation engine.
///
/// Backends implement [`execute`](EngineSession::execute) and
/// [`read_channels`](EngineSession::read_channels); the named commands are thin wrappers so
/// call sites read like the engine's own command set.
///
/// The session is a singleton resource: one case holds it at a time and tears it down
/// (channels deleted, capture released) before the next case starts.
pub trait EngineSession {
    /// Backend name for logs.
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<(), EngineFault>;

    fn close(&mut self) -> Result<(), EngineFault>;

    /// Brings the session back to a clean state after a host fault.
    fn reset(&mut self) -> Result<(), EngineFault> {
        self.close()?;
        self.open()
    }

    /// Sink for all free text the engine produces.
    fn diagnostics_mut(&mut self) -> &mut DiagnosticBuffer;

    fn execute(&mut self, command: &EngineCommand) -> EngineResult;

    /// Reads a channel output file back as labels and samples, time channel first.
    fn read_channels(&mut self, output: &Path) -> Result<ChannelDump, EngineFault>;

    fn initialize(&mut self, capacity: u32) -> EngineResult {
        self.execute(&EngineCommand::Initialize { capacity })
    }

    fn load_case(&mut self, path: &Path) -> EngineResult {
        self.execute(&EngineCommand::LoadCase {
            path: path.to_path_buf(),
        })
    }

    fn read_raw(&mut self, path: &Path) -> EngineResult {
        self.execute(&EngineCommand::ReadRaw {
            path: path.to_path_buf(),
        })
    }

    fn save_case(&mut self, path: &Path) -> EngineResult {
        self.execute(&EngineCommand::SaveCase {
            path: path.to_path_buf(),
        })
    }

    fn solve_power_flow(&mut self, options: &PowerFlowOptions) -> EngineResult {
        self.execute(&EngineCommand::SolvePowerFlow { options: *options })
    }

    fn convert_generators(&mut self) -> EngineResult {
        self.execute(&EngineCommand::ConvertGenerators)
    }

    fn convert_loads(&mut self, conversion: &LoadConversion) -> EngineResult {
        self.execute(&EngineCommand::ConvertLoads {
            conversion: *conversion,
        })
    }

    fn factorize_network(&mut self) -> EngineResult {
        self.execute(&EngineCommand::FactorizeNetwork)
    }

    fn load_dynamics(&mut self, path: &Path) -> EngineResult {
        self.execute(&EngineCommand::LoadDynamics {
            path: path.to_path_buf(),
        })
    }

    fn delete_channels(&mut self) -> EngineResult {
        self.execute(&EngineCommand::DeleteChannels)
    }

    fn configure_channels(&mut self, quantities: &[ChannelQuantity]) -> EngineResult {
        self.execute(&EngineCommand::ConfigureChannels {
            quantities: quantities.to_vec(),
        })
    }

    fn start_dynamic_run(&mut self, output: &Path) -> EngineResult {
        self.execute(&EngineCommand::StartDynamicRun {
            output: output.to_path_buf(),
        })
    }

    fn redirect_channel_output(&mut self, output: &Path) -> EngineResult {
        self.execute(&EngineCommand::RedirectChannelOutput {
            output: output.to_path_buf(),
        })
    }

    fn advance(&mut self, to: Seconds) -> EngineResult {
        self.execute(&EngineCommand::Advance { to })
    }

    fn apply_branch_fault(
        &mut self,
        from_bus: BusId,
        to_bus: BusId,
        circuit: &str,
        base_kv: Kilovolts,
        impedance: FaultImpedance,
    ) -> EngineResult {
        self.execute(&EngineCommand::ApplyBranchFault {
            from_bus,
            to_bus,
            circuit: circuit.to_string(),
            base_kv,
            impedance,
        })
    }

    fn trip_branch(&mut self, from_bus: BusId, to_bus: BusId, circuit: &str) -> EngineResult {
        self.execute(&EngineCommand::TripBranch {
            from_bus,
            to_bus,
            circuit: circuit.to_string(),
        })
    }

    fn change_machine_power(
        &mut self,
        bus: BusId,
        machine: &str,
        active_power: Megawatts,
    ) -> EngineResult {
        self.execute(&EngineCommand::ChangeMachinePower {
            bus,
            machine: machine.to_string(),
            active_power,
        })
    }

    fn clear_fault(&mut self, fault_id: u32) -> EngineResult {
        self.execute(&EngineCommand::ClearFault { fault_id })
    }
}

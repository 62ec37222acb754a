use serde::{Deserialize, Serialize};
use stabsim_core::{
    BaseCase, ChannelDump, DisturbanceSpec, EngineOutcome, SimulationCase, StabError,
};
use stabsim_engine::{
    ConversionStep, DiagnosticCapture, EngineFault, EngineSession, LoadConversion,
    PowerFlowOptions,
};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::classify::OutputClassifier;
use crate::disturbance::{ControllerState, DisturbanceController, DisturbanceTiming};
use crate::status::StatusLog;

/// Bus capacity the engine is initialized with unless configured otherwise.
pub const DEFAULT_CAPACITY: u32 = 200_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub capacity: u32,
    pub timing: DisturbanceTiming,
    pub power_flow: PowerFlowOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            timing: DisturbanceTiming::default(),
            power_flow: PowerFlowOptions::default(),
        }
    }
}

/// Everything one run produced before channel reduction.
#[derive(Debug)]
pub struct RawRun {
    pub outcome: EngineOutcome,
    pub dump: ChannelDump,
    pub statuses: StatusLog,
    /// Engine text captured from `initialize` through channel teardown
    pub diagnostics: String,
    pub transitions: Vec<ControllerState>,
    /// Set when the disturbance could not be resolved and the run went on without it
    pub disturbance_issue: Option<StabError>,
}

#[derive(Debug, Clone, Default)]
pub struct RunDriver {
    options: RunOptions,
    classifier: OutputClassifier,
}

impl RunDriver {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            classifier: OutputClassifier::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: OutputClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs one simulation of `case` and reads its channels back from `output`.
    ///
    /// The command sequence runs to completion whatever status codes the engine returns. Only a
    /// host fault stops it; the capture is released either way and whatever text it held is
    /// logged at debug level.
    pub fn run<E: EngineSession + ?Sized>(
        &self,
        engine: &mut E,
        case: &SimulationCase,
        disturbance: Option<&DisturbanceSpec>,
        output: &Path,
    ) -> Result<RawRun, EngineFault> {
        info!(
            case = %case.name,
            disturbance = %case.disturbance,
            channels = %case.channel_mode,
            runtime = %case.runtime,
            engine = engine.name(),
            "Starting simulation"
        );

        let mut statuses = StatusLog::new();
        let mut controller = DisturbanceController::new(self.options.timing, output);

        let mut capture = DiagnosticCapture::begin(engine);
        let sequence = self.run_sequence(
            &mut *capture,
            case,
            disturbance,
            output,
            &mut controller,
            &mut statuses,
        );
        let diagnostics = capture.finish();

        if let Err(fault) = sequence {
            for line in diagnostics.lines().filter(|line| !line.trim().is_empty()) {
                debug!(target: "stabsim::engine", "{line}");
            }
            error!(case = %case.name, state = %controller.state(), error = %fault, "Engine fault during simulation");
            return Err(fault);
        }

        let outcome = self.classifier.classify(&diagnostics);
        match outcome {
            EngineOutcome::Converged => info!(case = %case.name, %outcome, "Simulation finished"),
            EngineOutcome::Unclassified => {
                warn!(case = %case.name, %outcome, "Simulation finished without a recognised marker")
            }
            EngineOutcome::NotConverged | EngineOutcome::NumericalFailure => {
                error!(case = %case.name, %outcome, "Simulation failed; exporting channel data anyway")
            }
        }

        let dump = engine.read_channels(output)?;
        debug!(
            case = %case.name,
            channels = dump.channel_count(),
            samples = dump.time().len(),
            "Channel output read"
        );

        Ok(RawRun {
            outcome,
            dump,
            statuses,
            diagnostics,
            transitions: controller.transitions().to_vec(),
            disturbance_issue: controller.into_issue(),
        })
    }

    fn run_sequence<E: EngineSession + ?Sized>(
        &self,
        engine: &mut E,
        case: &SimulationCase,
        disturbance: Option<&DisturbanceSpec>,
        output: &Path,
        controller: &mut DisturbanceController<'_>,
        statuses: &mut StatusLog,
    ) -> Result<(), EngineFault> {
        statuses.record("initialize", engine.initialize(self.options.capacity))?;
        match &case.base_case {
            BaseCase::Saved(path) => statuses.record("load_case", engine.load_case(path))?,
            BaseCase::Raw(path) => statuses.record("read_raw", engine.read_raw(path))?,
        }
        statuses.record(
            "solve_power_flow",
            engine.solve_power_flow(&self.options.power_flow),
        )?;

        statuses.record("convert_generators", engine.convert_generators())?;
        for step in ConversionStep::SEQUENCE {
            statuses.record(
                "convert_loads",
                engine.convert_loads(&LoadConversion::constant_impedance(step)),
            )?;
        }
        statuses.record("factorize_network", engine.factorize_network())?;

        if let Some(dynamics) = &case.dynamics {
            statuses.record("load_dynamics", engine.load_dynamics(dynamics))?;
        }

        statuses.record("delete_channels", engine.delete_channels())?;
        let quantities = case.channel_mode.quantities();
        if !quantities.is_empty() {
            statuses.record("configure_channels", engine.configure_channels(&quantities))?;
        }
        statuses.record("start_dynamic_run", engine.start_dynamic_run(output))?;

        controller.run(engine, case, disturbance, statuses)
    }
}

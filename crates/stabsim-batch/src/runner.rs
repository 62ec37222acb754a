use anyhow::{Context, Result};
use stabsim_core::{ArtifactNaming, ContingencyRegistry, SimulationCase, StabError};
use stabsim_engine::EngineSession;
use stabsim_sim::RunDriver;
use stabsim_ts::ChannelReducer;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::cases::resolve_case_files;
use crate::job::{jobs_from_suite, BatchJob, BatchJobRecord, JobStatus};
use crate::manifest::{write_batch_manifest, BatchManifest, MANIFEST_FILE};
use crate::report::{default_reporters, report_signals, ReportContext, Reporter};
use crate::suite::SuiteConfig;

/// Counts and manifest location of a finished batch.
#[derive(Debug)]
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<BatchJobRecord>,
}

/// Why a pair did not finish cleanly.
enum PairFailure {
    /// Never runnable; nothing was sent to the engine for this pair's run
    Skipped(StabError),
    /// Host fault; the engine session has to be reset before the next pair
    Fault(String),
    /// Run finished but its artifacts could not all be written
    Failed(String),
}

impl From<StabError> for PairFailure {
    fn from(err: StabError) -> Self {
        if err.is_configuration() {
            PairFailure::Skipped(err)
        } else {
            PairFailure::Fault(err.to_string())
        }
    }
}

/// Runs every (contingency, case) pair of a suite, one after the other, on one engine session.
pub struct BatchRunner {
    suite: SuiteConfig,
    registry: ContingencyRegistry,
    driver: RunDriver,
    reporters: Vec<Box<dyn Reporter>>,
}

impl BatchRunner {
    /// Validates `suite` and prepares the runner; nothing touches the engine yet.
    pub fn new(suite: SuiteConfig) -> Result<Self> {
        suite.validate().context("validating suite")?;
        Ok(Self {
            registry: suite.registry(),
            driver: RunDriver::new(suite.run_options()),
            reporters: default_reporters(),
            suite,
        })
    }

    pub fn with_reporters(mut self, reporters: Vec<Box<dyn Reporter>>) -> Self {
        self.reporters = reporters;
        self
    }

    pub fn suite(&self) -> &SuiteConfig {
        &self.suite
    }

    pub fn run<E: EngineSession + ?Sized>(&self, engine: &mut E) -> Result<BatchSummary> {
        let jobs = jobs_from_suite(&self.suite).context("planning batch jobs")?;
        let results_root = &self.suite.results_root;
        fs::create_dir_all(results_root).with_context(|| {
            format!("creating results root '{}'", results_root.display())
        })?;

        info!(
            engine = engine.name(),
            jobs = jobs.len(),
            results = %results_root.display(),
            "Starting dynamic simulation suite"
        );
        engine
            .open()
            .with_context(|| format!("opening {} engine session", engine.name()))?;

        let mut records = Vec::with_capacity(jobs.len());
        let mut current_event: Option<&str> = None;
        for job in &jobs {
            if current_event != Some(job.description.as_str()) {
                info!(contingency_type = %job.disturbance, "Running {}", job.description);
                current_event = Some(job.description.as_str());
            }
            records.push(self.run_job(engine, job));
        }

        if let Err(err) = engine.close() {
            warn!(error = %err, "Engine session did not close cleanly");
        }

        let manifest = BatchManifest::new(
            engine.name(),
            self.suite.channel_mode,
            self.suite.runtime,
            records,
        );
        info!(
            success = manifest.success,
            failure = manifest.failure,
            skipped = manifest.skipped,
            "All simulations completed"
        );
        let manifest_path = results_root.join(MANIFEST_FILE);
        write_batch_manifest(&manifest_path, &manifest)?;

        Ok(BatchSummary {
            success: manifest.success,
            failure: manifest.failure,
            skipped: manifest.skipped,
            manifest_path,
            jobs: manifest.jobs,
        })
    }

    /// Runs one pair. Whatever happens is recorded; nothing escapes to abort the batch.
    fn run_job<E: EngineSession + ?Sized>(&self, engine: &mut E, job: &BatchJob) -> BatchJobRecord {
        let started = Instant::now();
        let mut record = BatchJobRecord::for_job(job, JobStatus::Ok);
        info!(case = %job.case, contingency_type = %job.disturbance, "Processing case");

        match self.execute(engine, job, &mut record) {
            Ok(()) => {}
            Err(PairFailure::Skipped(err)) => {
                error!(case = %job.case, contingency_type = %job.disturbance, error = %err, "Skipping case");
                record.status = JobStatus::Skipped;
                record.error = Some(err.to_string());
            }
            Err(PairFailure::Fault(message)) => {
                error!(case = %job.case, contingency_type = %job.disturbance, error = %message, "Error running simulation");
                record.status = JobStatus::Error;
                record.error = Some(message);
                if let Err(err) = engine.reset() {
                    error!(error = %err, "Engine session could not be reset");
                }
            }
            Err(PairFailure::Failed(message)) => {
                error!(case = %job.case, contingency_type = %job.disturbance, error = %message, "Reporting incomplete");
                record.status = JobStatus::Error;
                record.error = Some(message);
            }
        }

        record.duration_secs = started.elapsed().as_secs_f64();
        if record.status == JobStatus::Ok {
            info!(case = %job.case, "Simulation completed in {:.2} seconds", record.duration_secs);
        }
        record
    }

    fn execute<E: EngineSession + ?Sized>(
        &self,
        engine: &mut E,
        job: &BatchJob,
        record: &mut BatchJobRecord,
    ) -> Result<(), PairFailure> {
        let resolved = self.registry.resolve(&job.case, job.disturbance);
        if resolved.is_unknown() {
            warn!(case = %job.case, contingency_type = %job.disturbance, "No contingency registered for this case");
            record.warnings.push(format!(
                "no contingency registered for ({}, {})",
                job.case, job.disturbance
            ));
        }
        info!(case = %job.case, contingency = %resolved.name, "Contingency resolved");
        record.contingency = Some(resolved.name.clone());

        let case_dir = absolute(&self.suite.case_root.join(&job.case))
            .map_err(|err| PairFailure::Failed(format!("resolving case directory: {err}")))?;
        let files = resolve_case_files(engine, &case_dir, self.suite.engine.capacity)?;
        info!(
            case = %job.case,
            base_case = %files.base_case.path().display(),
            dynamics = ?files.dynamics,
            "Using case files"
        );

        let case = SimulationCase {
            name: job.case.clone(),
            directory: case_dir,
            base_case: files.base_case,
            dynamics: files.dynamics,
            disturbance: job.disturbance,
            channel_mode: self.suite.channel_mode,
            runtime: self.suite.runtime,
        };
        let naming = ArtifactNaming::for_case(&resolved.name, &case);
        let output_dir = absolute(&naming.output_dir(&self.suite.results_root))
            .map_err(|err| PairFailure::Failed(format!("resolving output directory: {err}")))?;
        fs::create_dir_all(&output_dir).map_err(|err| {
            PairFailure::Failed(format!(
                "creating output directory '{}': {err}",
                output_dir.display()
            ))
        })?;
        let output = output_dir.join(naming.channel_file());

        let run = self
            .driver
            .run(engine, &case, resolved.disturbance.as_ref(), &output)
            .map_err(|fault| PairFailure::Fault(fault.to_string()))?;
        record.outcome = Some(run.outcome);
        if let Some(issue) = &run.disturbance_issue {
            record.warnings.push(issue.to_string());
        }

        let signals = ChannelReducer::new().reduce(&run.dump);
        let context = ReportContext {
            naming: &naming,
            output_dir: &output_dir,
            event: &job.description,
        };
        let report = report_signals(&self.reporters, &signals, &context);
        record.artifacts = report
            .artifacts
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        if !report.errors.is_empty() {
            return Err(PairFailure::Failed(report.errors.join("; ")));
        }
        Ok(())
    }
}

/// Validates `suite` and runs it on `engine`.
pub fn run_batch<E: EngineSession + ?Sized>(
    suite: &SuiteConfig,
    engine: &mut E,
) -> Result<BatchSummary> {
    BatchRunner::new(suite.clone())?.run(engine)
}

/// Engine commands take absolute paths.
fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

//! Batch orchestration for dynamic simulation suites.
//!
//! A suite ([`SuiteConfig`]) expands into one job per (contingency, case) pair. Each job
//! resolves its contingency and case files, runs through the [`RunDriver`](stabsim_sim::RunDriver),
//! is reduced to signal tables and handed to the [`Reporter`]s. Jobs run strictly one after the
//! other on a single engine session; a failing job is recorded in the batch manifest and the
//! batch moves on.

pub mod cases;
pub mod job;
pub mod manifest;
pub mod report;
pub mod runner;
pub mod suite;

pub use cases::{convert_raw, resolve_case_files, CaseFiles, CaseInventory};
pub use job::{jobs_from_suite, BatchJob, BatchJobRecord, JobStatus};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest, MANIFEST_FILE};
pub use report::{
    default_reporters, report_signals, ChartReporter, CsvReporter, ReportContext, ReportOutcome,
    Reporter,
};
pub use runner::{run_batch, BatchRunner, BatchSummary};
pub use suite::{
    load_suite, ContingencyConfig, EngineBackend, EngineSettings, LoggingSettings, SuiteConfig,
};

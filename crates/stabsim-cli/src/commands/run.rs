use anyhow::{Context, Result};
use stabsim_batch::{load_suite, run_batch, BatchSummary, EngineBackend, JobStatus, SuiteConfig};
use stabsim_cli::cli::EngineChoice;
use stabsim_engine::{BridgeEngine, EngineSession, ScriptedEngine};
use std::path::Path;
use tracing::info;

/// Loads the suite (or the defaults) and applies command-line overrides.
///
/// Relative roots in a suite file are taken relative to that file.
pub fn prepare_suite(
    config: Option<&Path>,
    case_root: Option<&Path>,
    results: Option<&Path>,
    engine: Option<EngineChoice>,
) -> Result<SuiteConfig> {
    let mut suite = match config {
        Some(path) => {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            load_suite(path)?.rebase(base)
        }
        None => SuiteConfig::default(),
    };
    if let Some(case_root) = case_root {
        suite.case_root = case_root.to_path_buf();
    }
    if let Some(results) = results {
        suite.results_root = results.to_path_buf();
    }
    if let Some(engine) = engine {
        suite.engine.backend = engine.into();
    }
    suite
        .validate()
        .with_context(|| match config {
            Some(path) => format!("validating suite '{}'", path.display()),
            None => "validating default suite".to_string(),
        })?;
    Ok(suite)
}

fn open_engine(suite: &SuiteConfig) -> Box<dyn EngineSession> {
    match suite.engine.backend {
        EngineBackend::Scripted => Box::new(ScriptedEngine::new()),
        EngineBackend::Bridge => Box::new(BridgeEngine::new(suite.engine.bridge_config())),
    }
}

pub fn handle(suite: &SuiteConfig) -> Result<()> {
    info!(
        backend = %suite.engine.backend,
        cases = suite.cases.len(),
        contingencies = suite.contingencies.len(),
        "Suite loaded"
    );
    let mut engine = open_engine(suite);
    let summary = run_batch(suite, engine.as_mut())?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "Batch finished: {} ok, {} failed, {} skipped ({} jobs)",
        summary.success,
        summary.failure,
        summary.skipped,
        summary.jobs.len()
    );
    for job in summary
        .jobs
        .iter()
        .filter(|job| job.status != JobStatus::Ok)
    {
        println!(
            "  {} {} - {}",
            job.status,
            job.job_id,
            job.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("Manifest: {}", summary.manifest_path.display());
}

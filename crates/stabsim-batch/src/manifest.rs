use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stabsim_core::{ChannelMode, Seconds};
use std::fs;
use std::path::Path;

use crate::job::{BatchJobRecord, JobStatus};

pub const MANIFEST_FILE: &str = "batch_manifest.json";

/// Record of one batch: what ran, against which engine, and how every pair ended.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchManifest {
    pub created_at: DateTime<Utc>,
    pub engine: String,
    pub channel_mode: String,
    pub runtime_secs: f64,
    pub num_jobs: usize,
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub jobs: Vec<BatchJobRecord>,
}

impl BatchManifest {
    /// Builds a manifest stamped now, with the counts derived from `jobs`.
    pub fn new(
        engine: &str,
        channel_mode: ChannelMode,
        runtime: Seconds,
        jobs: Vec<BatchJobRecord>,
    ) -> Self {
        let count = |status| jobs.iter().filter(|job| job.status == status).count();
        let (success, failure, skipped) = (
            count(JobStatus::Ok),
            count(JobStatus::Error),
            count(JobStatus::Skipped),
        );
        Self {
            created_at: Utc::now(),
            engine: engine.to_string(),
            channel_mode: channel_mode.label().to_string(),
            runtime_secs: runtime.value(),
            num_jobs: jobs.len(),
            success,
            failure,
            skipped,
            jobs,
        }
    }

    /// Pairs that did not end `ok`, in run order.
    pub fn unfinished(&self) -> impl Iterator<Item = &BatchJobRecord> {
        self.jobs.iter().filter(|job| job.status != JobStatus::Ok)
    }

    /// Checks that the header counts agree with the job records.
    pub fn check_counts(&self) -> Result<()> {
        let recount = |status| self.jobs.iter().filter(|job| job.status == status).count();
        let expected = [
            ("num_jobs", self.num_jobs, self.jobs.len()),
            ("success", self.success, recount(JobStatus::Ok)),
            ("failure", self.failure, recount(JobStatus::Error)),
            ("skipped", self.skipped, recount(JobStatus::Skipped)),
        ];
        for (field, stated, actual) in expected {
            if stated != actual {
                bail!("{field} says {stated} but the job list holds {actual}");
            }
        }
        Ok(())
    }
}

/// Writes the manifest as pretty JSON, replacing any previous one in a single rename.
pub fn write_batch_manifest(path: &Path, manifest: &BatchManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
    }
    let json =
        serde_json::to_string_pretty(manifest).context("serializing batch manifest to JSON")?;
    let staging = path.with_extension("json.partial");
    fs::write(&staging, json)
        .with_context(|| format!("writing batch manifest '{}'", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("moving batch manifest into '{}'", path.display()))?;
    Ok(())
}

/// Loads a manifest and rejects one whose counts disagree with its job records.
pub fn load_batch_manifest(path: &Path) -> Result<BatchManifest> {
    let file = fs::File::open(path)
        .with_context(|| format!("opening batch manifest '{}'", path.display()))?;
    let manifest: BatchManifest = serde_json::from_reader(file)
        .with_context(|| format!("parsing batch manifest '{}'", path.display()))?;
    manifest
        .check_counts()
        .with_context(|| format!("inconsistent batch manifest '{}'", path.display()))?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stabsim_core::{DisturbanceKind, EngineOutcome};
    use tempfile::tempdir;

    fn record(case: &str, status: JobStatus) -> BatchJobRecord {
        BatchJobRecord {
            job_id: format!("line_fault:{case}"),
            case: case.into(),
            disturbance: DisturbanceKind::LineFault,
            contingency: None,
            status,
            outcome: None,
            error: None,
            warnings: Vec::new(),
            artifacts: Vec::new(),
            duration_secs: 0.0,
        }
    }

    #[test]
    fn counts_come_from_the_records() {
        let manifest = BatchManifest::new(
            "scripted",
            ChannelMode::Voltage,
            Seconds(20.0),
            vec![
                record("case_NRE", JobStatus::Ok),
                record("case_RE", JobStatus::Error),
                record("case_X", JobStatus::Skipped),
                record("case_Y", JobStatus::Ok),
            ],
        );
        assert_eq!(manifest.num_jobs, 4);
        assert_eq!((manifest.success, manifest.failure, manifest.skipped), (2, 1, 1));
        assert_eq!(manifest.channel_mode, ChannelMode::Voltage.label());
        let unfinished: Vec<&str> = manifest.unfinished().map(|job| job.case.as_str()).collect();
        assert_eq!(unfinished, vec!["case_RE", "case_X"]);
        manifest.check_counts().unwrap();
    }

    #[test]
    fn tampered_counts_are_rejected_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let mut manifest = BatchManifest::new(
            "scripted",
            ChannelMode::All,
            Seconds(20.0),
            vec![record("case_NRE", JobStatus::Error)],
        );
        manifest.success = 1;
        write_batch_manifest(&path, &manifest).unwrap();

        let err = load_batch_manifest(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("inconsistent batch manifest"));
        assert!(message.contains("success says 1"));
    }

    #[test]
    fn manifest_writes_and_reads_back() {
        let record = BatchJobRecord {
            job_id: "line_fault:case_NRE".into(),
            case: "case_NRE".into(),
            disturbance: DisturbanceKind::LineFault,
            contingency: Some("line_trip_5-7".into()),
            status: JobStatus::Ok,
            outcome: Some(EngineOutcome::Converged),
            error: None,
            warnings: Vec::new(),
            artifacts: vec!["results/line_trip_5-7/case_NRE/case_NRE_line_fault_All_20s_POWR.csv".into()],
            duration_secs: 0.25,
        };
        let manifest = BatchManifest {
            created_at: Utc::now(),
            engine: "scripted".into(),
            channel_mode: "All".into(),
            runtime_secs: 20.0,
            num_jobs: 1,
            success: 1,
            failure: 0,
            skipped: 0,
            jobs: vec![record.clone()],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(MANIFEST_FILE);
        write_batch_manifest(&path, &manifest).unwrap();
        assert!(!path.with_extension("json.partial").exists());

        let parsed = load_batch_manifest(&path).unwrap();
        assert_eq!(parsed.engine, "scripted");
        assert_eq!(parsed.jobs.first().unwrap(), &record);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"status\": \"ok\""));
        assert!(text.contains("\"outcome\": \"converged\""));
    }

    #[test]
    fn missing_manifest_names_the_path() {
        let err = load_batch_manifest(Path::new("/nonexistent/batch_manifest.json")).unwrap_err();
        assert!(err.to_string().contains("opening batch manifest"));
    }
}

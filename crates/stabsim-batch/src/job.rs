use serde::{Deserialize, Serialize};
use stabsim_core::{DisturbanceKind, EngineOutcome, StabResult};
use std::fmt;

use crate::suite::{ContingencyConfig, SuiteConfig};

/// One (contingency, case) pair of a suite.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub job_id: String,
    pub case: String,
    pub disturbance: DisturbanceKind,
    pub description: String,
}

impl BatchJob {
    fn new(contingency: &ContingencyConfig, kind: DisturbanceKind, case: &str) -> Self {
        Self {
            job_id: format!("{kind}:{case}"),
            case: case.to_string(),
            disturbance: kind,
            description: contingency.label().to_string(),
        }
    }
}

/// Expands the suite into jobs: contingencies in the outer loop, cases in the inner one.
pub fn jobs_from_suite(suite: &SuiteConfig) -> StabResult<Vec<BatchJob>> {
    let mut jobs = Vec::with_capacity(suite.contingencies.len() * suite.cases.len());
    for contingency in &suite.contingencies {
        let kind = contingency.disturbance_kind()?;
        for case in &suite.cases {
            jobs.push(BatchJob::new(contingency, kind, case));
        }
    }
    Ok(jobs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Ok,
    /// Host fault or reporting failure
    Error,
    /// Never runnable: missing case inputs and the like
    Skipped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Ok => "ok",
            JobStatus::Error => "error",
            JobStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub job_id: String,
    pub case: String,
    pub disturbance: DisturbanceKind,
    /// Resolved contingency name; `None` when the pair never got that far
    pub contingency: Option<String>,
    pub status: JobStatus,
    pub outcome: Option<EngineOutcome>,
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    pub duration_secs: f64,
}

impl BatchJobRecord {
    pub(crate) fn for_job(job: &BatchJob, status: JobStatus) -> Self {
        Self {
            job_id: job.job_id.clone(),
            case: job.case.clone(),
            disturbance: job.disturbance,
            contingency: None,
            status,
            outcome: None,
            error: None,
            warnings: Vec::new(),
            artifacts: Vec::new(),
            duration_secs: 0.0,
        }
    }
}

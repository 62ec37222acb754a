use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict for one run, derived from the engine's diagnostic text rather than its status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineOutcome {
    Converged,
    NotConverged,
    NumericalFailure,
    Unclassified,
}

impl EngineOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineOutcome::Converged => "converged",
            EngineOutcome::NotConverged => "not_converged",
            EngineOutcome::NumericalFailure => "numerical_failure",
            EngineOutcome::Unclassified => "unclassified",
        }
    }

    /// Non-convergence and invalid numbers need operator review. The data is still exported.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EngineOutcome::NotConverged | EngineOutcome::NumericalFailure
        )
    }
}

impl fmt::Display for EngineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

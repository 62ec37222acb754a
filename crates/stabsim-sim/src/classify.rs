//! Text-based outcome classification.
//!
//! The engine's status codes do not say whether a dynamic run is usable; its printed diagnostics
//! do. Markers are checked as plain substrings in a fixed priority order and the first rule that
//! matches wins, so a non-convergence report outranks an "initial conditions OK" line printed
//! earlier in the same run.

use serde::{Deserialize, Serialize};
use stabsim_core::EngineOutcome;

pub const NOT_CONVERGED_MARKER: &str = "Network not converged";
pub const NUMERICAL_FAILURE_MARKER: &str = "NaN";
pub const CONVERGED_MARKER: &str = "INITIAL CONDITIONS CHECK O.K.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputClassifier {
    pub not_converged: Vec<String>,
    pub numerical_failure: Vec<String>,
    pub converged: Vec<String>,
}

impl Default for OutputClassifier {
    fn default() -> Self {
        Self {
            not_converged: vec![NOT_CONVERGED_MARKER.to_string()],
            numerical_failure: vec![NUMERICAL_FAILURE_MARKER.to_string()],
            converged: vec![CONVERGED_MARKER.to_string()],
        }
    }
}

impl OutputClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, text: &str) -> EngineOutcome {
        let contains_any = |markers: &[String]| markers.iter().any(|m| text.contains(m.as_str()));

        if contains_any(&self.not_converged) {
            EngineOutcome::NotConverged
        } else if contains_any(&self.numerical_failure) {
            EngineOutcome::NumericalFailure
        } else if contains_any(&self.converged) {
            EngineOutcome::Converged
        } else {
            EngineOutcome::Unclassified
        }
    }
}

use std::path::{Path, PathBuf};

use crate::case::{ChannelMode, DisturbanceKind, SimulationCase};
use crate::channel::SignalKind;
use crate::units::Seconds;

/// Naming context for every artifact one run produces.
///
/// ```text
/// <results>/<contingency>/<case>/
///   <case>_<disturbance>_<mode>_<runtime>s.outx        # engine channel output
///   <SIGNAL>_<case>_<disturbance>_<mode>_<runtime>s.svg
///   <case>_<disturbance>_<mode>_<runtime>s_<SIGNAL>.csv
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactNaming {
    pub contingency: String,
    pub case: String,
    pub disturbance: DisturbanceKind,
    pub channel_mode: ChannelMode,
    pub runtime: Seconds,
}

impl ArtifactNaming {
    pub fn for_case(contingency: &str, case: &SimulationCase) -> Self {
        Self {
            contingency: contingency.to_string(),
            case: case.name.clone(),
            disturbance: case.disturbance,
            channel_mode: case.channel_mode,
            runtime: case.runtime,
        }
    }

    /// `<case>_<disturbance>_<mode>_<runtime>s`
    pub fn run_label(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.case, self.disturbance, self.channel_mode, self.runtime
        )
    }

    pub fn output_dir(&self, results_root: &Path) -> PathBuf {
        results_root
            .join(sanitize_component(&self.contingency))
            .join(sanitize_component(&self.case))
    }

    pub fn channel_file(&self) -> String {
        format!("{}.outx", self.run_label())
    }

    pub fn chart_file(&self, kind: SignalKind) -> String {
        format!("{}_{}.svg", kind.artifact_name(), self.run_label())
    }

    pub fn csv_file(&self, kind: SignalKind) -> String {
        format!("{}_{}.csv", self.run_label(), kind.artifact_name())
    }
}

fn sanitize_component(value: &str) -> String {
    let filtered: String = value
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    if filtered.is_empty() {
        "unnamed".to_string()
    } else {
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming() -> ArtifactNaming {
        ArtifactNaming {
            contingency: "line_trip_5-7".into(),
            case: "case_NRE".into(),
            disturbance: DisturbanceKind::LineFault,
            channel_mode: ChannelMode::All,
            runtime: Seconds(20.0),
        }
    }

    #[test]
    fn artifact_names_follow_layout() {
        let naming = naming();
        assert_eq!(naming.run_label(), "case_NRE_line_fault_All_20s");
        assert_eq!(naming.channel_file(), "case_NRE_line_fault_All_20s.outx");
        assert_eq!(
            naming.chart_file(SignalKind::Speed),
            "SPEED_case_NRE_line_fault_All_20s.svg"
        );
        assert_eq!(
            naming.csv_file(SignalKind::Power),
            "case_NRE_line_fault_All_20s_POWR.csv"
        );
    }

    #[test]
    fn output_dir_is_contingency_then_case() {
        let dir = naming().output_dir(Path::new("results"));
        assert_eq!(dir, Path::new("results/line_trip_5-7/case_NRE"));
    }

    #[test]
    fn separators_in_names_do_not_escape_the_results_root() {
        let mut naming = naming();
        naming.contingency = "../evil".into();
        let dir = naming.output_dir(Path::new("results"));
        assert_eq!(dir, Path::new("results/.._evil/case_NRE"));
    }
}

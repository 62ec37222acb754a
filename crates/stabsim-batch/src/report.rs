//! Reporting collaborators: consume one signal table plus its naming context and write an
//! artifact. Empty tables mean "signal not recorded" and are skipped without error.

use anyhow::{Context, Result};
use stabsim_core::{ArtifactNaming, SignalKind};
use stabsim_ts::{write_csv, SignalSet, SignalTable};
use stabsim_viz::{write_chart, ChartSpec};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Where and under which names one run's artifacts go.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub naming: &'a ArtifactNaming,
    pub output_dir: &'a Path,
    /// Event description used in chart titles
    pub event: &'a str,
}

pub trait Reporter {
    fn name(&self) -> &'static str;

    /// Writes one artifact for a non-empty `table` and returns its path.
    fn report(&self, table: &SignalTable, context: &ReportContext<'_>) -> Result<PathBuf>;
}

/// `<case>_<disturbance>_<mode>_<runtime>s_<SIGNAL>.csv`
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReporter;

impl Reporter for CsvReporter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn report(&self, table: &SignalTable, context: &ReportContext<'_>) -> Result<PathBuf> {
        let path = context
            .output_dir
            .join(context.naming.csv_file(table.kind()));
        write_csv(table, &path)?;
        Ok(path)
    }
}

/// `<SIGNAL>_<case>_<disturbance>_<mode>_<runtime>s.svg`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartReporter;

impl Reporter for ChartReporter {
    fn name(&self) -> &'static str {
        "chart"
    }

    fn report(&self, table: &SignalTable, context: &ReportContext<'_>) -> Result<PathBuf> {
        let path = context
            .output_dir
            .join(context.naming.chart_file(table.kind()));
        let spec = ChartSpec::for_signal(table.kind(), context.event, context.naming.runtime);
        write_chart(table, &spec, &path)
            .with_context(|| format!("rendering chart '{}'", path.display()))?;
        Ok(path)
    }
}

pub fn default_reporters() -> Vec<Box<dyn Reporter>> {
    vec![Box::new(ChartReporter), Box::new(CsvReporter)]
}

/// What the reporters produced for one run.
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub artifacts: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Hands every non-empty table to every reporter.
///
/// A failing reporter does not stop the others; its error is logged and returned.
pub fn report_signals(
    reporters: &[Box<dyn Reporter>],
    signals: &SignalSet,
    context: &ReportContext<'_>,
) -> ReportOutcome {
    let mut outcome = ReportOutcome::default();
    for table in signals.iter() {
        if table.is_empty() {
            if table.kind() == SignalKind::Speed {
                warn!(case = %context.naming.case, "No speed data available to plot");
            } else {
                debug!(case = %context.naming.case, kind = %table.kind(), "No channels recorded; skipping");
            }
            continue;
        }
        for reporter in reporters {
            match reporter.report(table, context) {
                Ok(path) => outcome.artifacts.push(path),
                Err(err) => {
                    error!(
                        case = %context.naming.case,
                        kind = %table.kind(),
                        reporter = reporter.name(),
                        error = %format!("{err:#}"),
                        "Reporting failed"
                    );
                    outcome
                        .errors
                        .push(format!("{} {}: {err:#}", reporter.name(), table.kind()));
                }
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use stabsim_core::{ChannelDump, ChannelMode, DisturbanceKind, Seconds};
    use stabsim_ts::reduce_channels;
    use tempfile::tempdir;

    fn naming() -> ArtifactNaming {
        ArtifactNaming {
            contingency: "line_trip_5-7".into(),
            case: "case_NRE".into(),
            disturbance: DisturbanceKind::LineFault,
            channel_mode: ChannelMode::All,
            runtime: Seconds(20.0),
        }
    }

    fn signals_without_speed() -> SignalSet {
        reduce_channels(&ChannelDump {
            title: String::new(),
            labels: vec![
                "Time(s)".into(),
                "POWR 1[BUS1 16.500]1".into(),
                "VOLT 5[BUS5 230.00]".into(),
            ],
            samples: vec![
                vec![0.0, 1.0, 2.0],
                vec![71.6, 71.6, 72.0],
                vec![1.0, 0.98, 0.99],
            ],
        })
    }

    struct Failing;

    impl Reporter for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn report(&self, _: &SignalTable, _: &ReportContext<'_>) -> Result<PathBuf> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn writes_artifacts_for_non_empty_tables_only() {
        let dir = tempdir().unwrap();
        let naming = naming();
        let context = ReportContext {
            naming: &naming,
            output_dir: dir.path(),
            event: "Line trip contingency (5-7)",
        };
        let outcome = report_signals(&default_reporters(), &signals_without_speed(), &context);

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.artifacts.len(), 4);
        assert!(dir
            .path()
            .join("POWR_case_NRE_line_fault_All_20s.svg")
            .is_file());
        assert!(dir
            .path()
            .join("case_NRE_line_fault_All_20s_VOLT.csv")
            .is_file());
        assert!(!dir
            .path()
            .join("case_NRE_line_fault_All_20s_SPEED.csv")
            .exists());
    }

    #[test]
    fn failing_reporter_does_not_stop_the_rest() {
        let dir = tempdir().unwrap();
        let naming = naming();
        let context = ReportContext {
            naming: &naming,
            output_dir: dir.path(),
            event: "",
        };
        let reporters: Vec<Box<dyn Reporter>> = vec![Box::new(Failing), Box::new(CsvReporter)];
        let outcome = report_signals(&reporters, &signals_without_speed(), &context);
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors[0].contains("disk full"));
        assert_eq!(outcome.artifacts.len(), 2);
    }
}

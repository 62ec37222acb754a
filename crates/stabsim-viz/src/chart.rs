use plotters::prelude::*;
use stabsim_core::{Seconds, SignalKind};
use stabsim_ts::SignalTable;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::style::{palette_for, title_stem, y_label};

#[derive(Debug, Error)]
pub enum VizError {
    #[error("{0} table is empty; nothing to plot")]
    EmptyTable(SignalKind),

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("Failed to write chart: {0}")]
    Io(#[from] std::io::Error),
}

pub type VizResult<T> = Result<T, VizError>;

fn render_err<E: std::fmt::Display>(err: E) -> VizError {
    VizError::Render(err.to_string())
}

/// Layout of one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub y_label: String,
    pub palette: &'static [RGBColor],
    /// Time axis limits in seconds
    pub x_range: (f64, f64),
    /// Fixed value axis; `None` scales to the data
    pub y_range: Option<(f64, f64)>,
    pub size: (u32, u32),
}

impl ChartSpec {
    /// Standard chart for `kind`: titled after the event, time axis from zero to the run's end,
    /// value axis scaled to the data.
    pub fn for_signal(kind: SignalKind, event: &str, runtime: Seconds) -> Self {
        let title = if event.is_empty() {
            title_stem(kind).to_string()
        } else {
            format!("{} after {}", title_stem(kind), event)
        };
        Self {
            title,
            y_label: y_label(kind).to_string(),
            palette: palette_for(kind),
            x_range: (0.0, runtime.value()),
            y_range: None,
            size: (1000, 600),
        }
    }
}

/// Value axis with a little headroom. Flat data gets a band around its level.
fn auto_range(table: &SignalTable) -> (f64, f64) {
    match table.value_range() {
        None => (0.0, 1.0),
        Some((lo, hi)) if (hi - lo).abs() < f64::EPSILON => {
            let pad = if lo.abs() > 1.0 { lo.abs() * 0.01 } else { 0.01 };
            (lo - pad, hi + pad)
        }
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
    }
}

/// Renders `table` as an SVG document.
pub fn render_svg(table: &SignalTable, spec: &ChartSpec) -> VizResult<String> {
    if table.is_empty() {
        return Err(VizError::EmptyTable(table.kind()));
    }

    let (x_min, mut x_max) = spec.x_range;
    if x_max <= x_min {
        x_max = table.time().last().copied().unwrap_or(x_min + 1.0).max(x_min + 1.0);
    }
    let (y_min, y_max) = spec.y_range.unwrap_or_else(|| auto_range(table));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, spec.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&spec.title, ("sans-serif", 20, &BLACK))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc("Time (s)")
            .y_desc(spec.y_label.as_str())
            .label_style(("sans-serif", 12, &RGBColor(60, 60, 60)))
            .draw()
            .map_err(render_err)?;

        let palette = if spec.palette.is_empty() {
            &crate::style::DEFAULT_PALETTE[..]
        } else {
            spec.palette
        };
        for (idx, column) in table.columns().iter().enumerate() {
            let color = palette[idx % palette.len()];
            let points = table
                .time()
                .iter()
                .copied()
                .zip(column.values.iter().copied())
                .filter(|(_, value)| value.is_finite());
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(render_err)?
                .label(column.key.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.9))
            .border_style(BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

/// Renders `table` and writes it to `path`.
pub fn write_chart(table: &SignalTable, spec: &ChartSpec, path: &Path) -> VizResult<()> {
    let svg = render_svg(table, spec)?;
    std::fs::write(path, svg)?;
    debug!(path = %path.display(), kind = %table.kind(), "Chart written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stabsim_core::ChannelDump;
    use stabsim_ts::reduce_channels;

    fn tables() -> stabsim_ts::SignalSet {
        let dump = ChannelDump {
            title: String::new(),
            labels: vec![
                "Time(s)".into(),
                "VOLT 5[BUS5 230.00]".into(),
                "VOLT 7[BUS7 230.00]".into(),
                "POWR 2[BUS2 18.000]1".into(),
            ],
            samples: vec![
                vec![0.0, 1.0, 1.17, 20.0],
                vec![1.0, 1.0, 0.2, 0.99],
                vec![1.02, 1.02, 0.5, 1.01],
                vec![163.0, 163.0, 163.0, 163.0],
            ],
        };
        reduce_channels(&dump)
    }

    #[test]
    fn svg_contains_title_and_series_labels() {
        let set = tables();
        let spec = ChartSpec::for_signal(
            SignalKind::Voltage,
            "Line trip contingency (5-7)",
            Seconds(20.0),
        );
        let svg = render_svg(&set.voltage, &spec).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Bus Voltage Magnitude after Line trip contingency (5-7)"));
        assert!(svg.contains("BUS5"));
        assert!(svg.contains("BUS7"));
    }

    #[test]
    fn empty_table_is_rejected() {
        let set = tables();
        let spec = ChartSpec::for_signal(SignalKind::Speed, "", Seconds(20.0));
        assert!(matches!(
            render_svg(&set.speed, &spec),
            Err(VizError::EmptyTable(SignalKind::Speed))
        ));
    }

    #[test]
    fn flat_series_gets_a_visible_band() {
        let set = tables();
        let (lo, hi) = auto_range(&set.power);
        assert!(lo < 163.0 && hi > 163.0);
    }

    #[test]
    fn spec_uses_signal_palette_and_runtime() {
        let spec = ChartSpec::for_signal(SignalKind::Power, "gen trip", Seconds(12.5));
        assert_eq!(spec.palette.len(), 3);
        assert_eq!(spec.x_range, (0.0, 12.5));
        assert_eq!(spec.y_label, "MW");
        assert_eq!(spec.title, "Generator Power after gen trip");
    }

    #[test]
    fn writes_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("POWR_case_NRE_line_fault_All_20s.svg");
        let spec = ChartSpec::for_signal(SignalKind::Power, "", Seconds(20.0));
        write_chart(&tables().power, &spec, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Generator Power"));
    }
}

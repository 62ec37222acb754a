use anyhow::{Context, Result};
use stabsim_core::{ChannelDump, Seconds, SignalKind};
use stabsim_ts::{write_csv, ChannelReducer};
use stabsim_viz::{write_chart, ChartSpec};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

fn load_dump(path: &Path) -> Result<ChannelDump> {
    let file = File::open(path)
        .with_context(|| format!("opening channel dump '{}'", path.display()))?;
    let dump: ChannelDump = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing channel dump '{}'", path.display()))?;
    dump.validate()
        .with_context(|| format!("checking channel dump '{}'", path.display()))?;
    Ok(dump)
}

pub fn handle(dump_path: &Path, out_dir: &Path, label: &str, charts: bool) -> Result<()> {
    let dump = load_dump(dump_path)?;
    let signals = ChannelReducer::new().reduce(&dump);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory '{}'", out_dir.display()))?;
    let runtime = Seconds(dump.time().last().copied().unwrap_or(0.0));

    let mut tables = 0usize;
    for table in signals.iter() {
        let kind = table.kind();
        if table.is_empty() {
            if kind == SignalKind::Speed {
                warn!("No speed data available to plot");
            }
            continue;
        }
        tables += 1;

        let csv = out_dir.join(format!("{label}_{}.csv", kind.artifact_name()));
        write_csv(table, &csv)?;
        println!("{}", csv.display());

        if charts {
            let svg = out_dir.join(format!("{}_{label}.svg", kind.artifact_name()));
            write_chart(table, &ChartSpec::for_signal(kind, "", runtime), &svg)
                .with_context(|| format!("rendering chart '{}'", svg.display()))?;
            println!("{}", svg.display());
        }
    }

    if tables == 0 {
        warn!(dump = %dump_path.display(), "No recognised channels in dump");
    } else {
        info!(dump = %dump_path.display(), tables, "Channel dump reduced");
    }
    Ok(())
}

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::table::SignalTable;

pub const TIME_COLUMN: &str = "TIME";

/// Writes `table` as CSV with a leading `TIME` column, one row per time step.
pub fn write_table<W: Write>(table: &SignalTable, writer: W) -> Result<()> {
    if table.is_empty() {
        bail!("{} table is empty; nothing to export", table.kind());
    }

    let mut csv = csv::Writer::from_writer(writer);
    let header: Vec<&str> = std::iter::once(TIME_COLUMN).chain(table.keys()).collect();
    csv.write_record(&header)
        .context("writing CSV header")?;

    for (row, t) in table.time().iter().enumerate() {
        let record: Vec<String> = std::iter::once(*t)
            .chain(table.columns().iter().map(|column| column.values[row]))
            .map(|value| value.to_string())
            .collect();
        csv.write_record(&record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    csv.flush().context("flushing CSV writer")?;
    Ok(())
}

pub fn write_csv(table: &SignalTable, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating CSV file {}", path.display()))?;
    write_table(table, file).with_context(|| format!("exporting {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::reduce_channels;
    use stabsim_core::{ChannelDump, SignalKind};

    fn voltage_table() -> SignalTable {
        let dump = ChannelDump {
            title: String::new(),
            labels: vec![
                "Time(s)".into(),
                "VOLT 7[BUS7 230.00]".into(),
                "VOLT 5[BUS5 230.00]".into(),
            ],
            samples: vec![vec![0.0, 0.5], vec![1.02, 0.98], vec![0.99, 0.5]],
        };
        reduce_channels(&dump).voltage
    }

    #[test]
    fn csv_has_time_column_then_sorted_keys() {
        let mut out = Vec::new();
        write_table(&voltage_table(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "TIME,BUS5,BUS7");
        assert_eq!(lines[1], "0,0.99,1.02");
        assert_eq!(lines[2], "0.5,0.5,0.98");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_table_is_not_exported() {
        let mut out = Vec::new();
        assert!(write_table(&SignalTable::empty(SignalKind::Speed), &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn writes_file_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case_NRE_line_fault_All_20s_VOLT.csv");
        write_csv(&voltage_table(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("TIME,"));
    }
}

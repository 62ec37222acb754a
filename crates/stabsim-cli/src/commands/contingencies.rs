use anyhow::Result;
use stabsim_batch::load_suite;
use stabsim_cli::cli::OutputFormat;
use stabsim_core::{ContingencyRegistry, RegistryEntry};
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;

pub fn handle(config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let registry = match config {
        Some(path) => load_suite(path)?.registry(),
        None => ContingencyRegistry::builtin(),
    };
    let entries: Vec<&RegistryEntry> = registry.entries().collect();
    match format {
        OutputFormat::Plain => print_table(&entries),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            Ok(())
        }
    }
}

/// Entries in lookup order: suite entries first, then the built-ins.
fn print_table(entries: &[&RegistryEntry]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "CASE\tTYPE\tNAME\tDISTURBANCE")?;
    for entry in entries {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            entry.case,
            entry.kind,
            entry.name.as_deref().unwrap_or("-"),
            entry
                .disturbance
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string())
        )?;
    }
    writer.flush()?;
    Ok(())
}

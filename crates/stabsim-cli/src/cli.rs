use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use stabsim_batch::EngineBackend;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stabsim", author, version, about = "Batch driver for transient-stability simulations", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Also write logs to this file (defaults to the suite's `[logging] file` for `run`)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every (contingency, case) pair of a suite
    Run {
        /// Suite configuration (TOML, YAML or JSON); built-in defaults when omitted
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Override the case root directory
        #[arg(long, value_hint = ValueHint::DirPath)]
        case_root: Option<PathBuf>,
        /// Override the results root directory
        #[arg(long, value_hint = ValueHint::DirPath)]
        results: Option<PathBuf>,
        /// Override the engine backend
        #[arg(long, value_enum)]
        engine: Option<EngineChoice>,
    },
    /// Classify a saved engine log
    Classify {
        /// Text file with the engine's diagnostic output
        #[arg(value_hint = ValueHint::FilePath)]
        log: PathBuf,
    },
    /// Reduce a saved channel dump (JSON) to signal tables and export them
    Reduce {
        /// Channel dump with `labels` and `samples`, time channel first
        #[arg(value_hint = ValueHint::FilePath)]
        dump: PathBuf,
        /// Directory the tables are written to
        #[arg(short, long, default_value = ".", value_hint = ValueHint::DirPath)]
        out_dir: PathBuf,
        /// File name stem for the exported tables
        #[arg(long, default_value = "channels")]
        label: String,
        /// Also render one chart per table
        #[arg(long)]
        charts: bool,
    },
    /// Print the (case, disturbance type) contingency lookup table
    Contingencies {
        /// Suite whose registry entries extend the built-in table
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineChoice {
    /// External bridge process hosting the vendor engine
    Bridge,
    /// In-process scripted engine (dry runs)
    Scripted,
}

impl From<EngineChoice> for EngineBackend {
    fn from(choice: EngineChoice) -> Self {
        match choice {
            EngineChoice::Bridge => EngineBackend::Bridge,
            EngineChoice::Scripted => EngineBackend::Scripted,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "stabsim",
            "--log-level",
            "debug",
            "run",
            "--config",
            "suite.toml",
            "--engine",
            "scripted",
            "--results",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
        match cli.command {
            Commands::Run {
                config,
                engine,
                results,
                ..
            } => {
                assert_eq!(config, Some(PathBuf::from("suite.toml")));
                assert_eq!(engine, Some(EngineChoice::Scripted));
                assert_eq!(results, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

use clap::Parser;
use stabsim_cli::cli::{Cli, Commands};
use std::process::ExitCode;

mod commands;
mod logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Run {
            config,
            case_root,
            results,
            engine,
        } => {
            let suite = commands::run::prepare_suite(
                config.as_deref(),
                case_root.as_deref(),
                results.as_deref(),
                *engine,
            )?;
            let log_file = cli.log_file.as_deref().or(suite.logging.file.as_deref());
            let _guard = logging::init_logging(cli.log_level, log_file)?;
            commands::run::handle(&suite)
        }
        Commands::Classify { log } => {
            let _guard = logging::init_logging(cli.log_level, cli.log_file.as_deref())?;
            commands::classify::handle(log)
        }
        Commands::Reduce {
            dump,
            out_dir,
            label,
            charts,
        } => {
            let _guard = logging::init_logging(cli.log_level, cli.log_file.as_deref())?;
            commands::reduce::handle(dump, out_dir, label, *charts)
        }
        Commands::Contingencies { config, format } => {
            let _guard = logging::init_logging(cli.log_level, cli.log_file.as_deref())?;
            commands::contingencies::handle(config.as_deref(), *format)
        }
    }
}

//! Console and file logging.
//!
//! Console output goes to stderr so command output on stdout stays machine readable. The level
//! comes from `--log-level` unless `STABSIM_LOG` holds a filter directive.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "STABSIM_LOG";

/// Installs the global subscriber. The returned guard flushes the file writer on drop and has
/// to live until the program exits.
pub fn init_logging(level: Level, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory '{}'", dir.display()))?;
            let file_name = path
                .file_name()
                .with_context(|| format!("log file '{}' has no file name", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(guard)
}

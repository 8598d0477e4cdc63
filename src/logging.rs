//! File-backed tracing. The TUI owns the terminal, so log lines never go to
//! stdout or stderr; only a failure to set up the log file is reported there,
//! before the terminal is taken over.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "QUICKRAG_LOG";
pub const LOG_FILE: &str = "quickrag.log";

/// Install the global subscriber writing to `{log_dir}/quickrag.log`.
/// Keep the returned guard alive until exit so buffered lines get flushed.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .with(filter)
        .try_init()?;

    Ok(guard)
}

/// Like [`init`], but a log directory that cannot be resolved or created only
/// costs the log file: the reason goes to stderr and the program carries on.
pub fn try_init(log_dir: Result<PathBuf>) -> Option<WorkerGuard> {
    match log_dir.and_then(|dir| init(&dir)) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: file logging disabled: {:#}", err);
            None
        }
    }
}

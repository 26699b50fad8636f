use crate::common::error::{Result, SchoolError};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging with console output and a daily rolling JSON file
/// named `<target>.log` under `log_dir`.
///
/// `target` is the binary's crate name; it and `school_core` log at `info`
/// unless `RUST_LOG` says otherwise. Keep the returned guard alive for the
/// life of the process or buffered file lines are lost.
pub fn init_logging(target: &str, log_dir: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, format!("{target}.log"));
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{target}=info,school_core=info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| SchoolError::Internal(format!("Failed to install logger: {e}")))?;

    Ok(guard)
}

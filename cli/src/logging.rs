use maptoposter_core::api::{CliError, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// Human output goes to stderr so `generate` can keep stdout for results.
/// With `[logging] directory` set, a daily-rolling plain-text file is added;
/// the returned guard must live until exit or buffered lines are lost.
pub fn init_tracing(cfg: &LoggingConfig) -> Result<Option<WorkerGuard>, CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg.ansi)
        .with_target(true);

    let Some(dir) = &cfg.directory else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init()
            .map_err(|e| CliError::Command(format!("logging init failed: {e}")))?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::Command(format!("log directory {}: {e}", dir.display())))?;
    let appender = tracing_appender::rolling::daily(dir, &cfg.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| CliError::Command(format!("logging init failed: {e}")))?;

    Ok(Some(guard))
}

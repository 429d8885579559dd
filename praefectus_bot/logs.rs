use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sets up logging to stdout and to a daily rotating file under `logs/`.
///
/// `RUST_LOG` wins when set. Otherwise dependencies log at `warn` and the
/// bot's own crates at `level` (the `bot.log_level` setting, `info` when
/// unknown).
///
/// The returned guard flushes the file writer and must be kept alive.
pub fn setup_logging(level: Option<&str>) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "praefectus.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let default_filter = format!("warn,praefectus={}", level.unwrap_or("info"));

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn,praefectus=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}

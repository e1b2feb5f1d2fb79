use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Prefix of the daily log files.
pub const LOG_FILE_PREFIX: &str = "codescan-config";

/// Level used when `RUST_LOG` is not set.
pub fn default_filter(debug_mode: bool) -> &'static str {
    if debug_mode { "debug" } else { "info" }
}

/// Setup logging to stderr and, optionally, to daily rotating JSON files.
///
/// `RUST_LOG` takes precedence over `debug_mode`.
///
/// # Arguments
/// * `debug_mode` - If true, use debug level; otherwise use info level
/// * `log_dir` - Directory for log files; `None` logs to the console only
///
/// # Returns
/// The file writer's guard, which must be held until the program exits
pub fn setup_logging(debug_mode: bool, log_dir: Option<&Utf8Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug_mode)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(log_dir) => {
            if !log_dir.exists() {
                fs::create_dir_all(log_dir)
                    .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
            }

            let file_appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI codes in log files
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        "Logging initialized: debug={}, dir={:?}",
        debug_mode,
        log_dir
    );

    Ok(guard)
}

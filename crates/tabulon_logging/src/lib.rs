//! Shared logging setup for tabulon binaries.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::rolling::{self, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "tabulon=info,tabulon_schema=info,tabulon_runner=info";
const MAX_LOG_FILES: usize = 5;

/// Logging configuration shared by tabulon binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Overrides `$TABULON_HOME/logs`.
    pub log_dir: Option<PathBuf>,
}

/// Install a daily-rotated file layer plus a stderr layer.
///
/// The file layer follows `RUST_LOG` (or the default filter). Stderr only
/// shows warnings unless `verbose` is set.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = match config.log_dir {
        Some(dir) => dir,
        None => logs_dir()?,
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create logs directory: {}", log_dir.display()))?;

    let file_writer = rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(sanitize_name(config.app_name))
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(&log_dir)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))?;

    let file_filter = default_filter();
    let console_filter = if config.verbose {
        default_filter()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Tabulon home directory: `$TABULON_HOME`, else `~/.tabulon`.
pub fn tabulon_home() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var("TABULON_HOME") {
        return Ok(PathBuf::from(override_path));
    }
    dirs::home_dir()
        .map(|home| home.join(".tabulon"))
        .ok_or_else(|| anyhow!("Could not determine home directory. Set TABULON_HOME to continue."))
}

/// Logs directory: `<home>/logs`
pub fn logs_dir() -> Result<PathBuf> {
    Ok(tabulon_home()?.join("logs"))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

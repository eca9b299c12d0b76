use chrono::Local;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::{ProfileError, Result};

/// Installs the global subscriber: console output filtered by `RUST_LOG` (or the configured
/// level), plus a debug-level `app_<timestamp>.log` when a log directory is configured.
///
/// Returns the log file path, if one was opened.
pub fn init(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ProfileError::Config(format!("invalid log level `{}`: {e}", config.level)))?;
    let console = fmt::layer().with_target(false).with_filter(console_filter);

    let (file_layer, log_path) = match &config.directory {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name());
            let file = File::create(&path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| ProfileError::Config(format!("logging already initialised: {e}")))?;

    if let Some(path) = &log_path {
        tracing::info!(path = %path.display(), "logging to file");
    }
    Ok(log_path)
}

fn log_file_name() -> String {
    format!("app_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}

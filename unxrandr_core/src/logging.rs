// src/logging.rs
//! Logger setup. Log lines never go to stdout: stdout carries the command.

use std::path::{Path, PathBuf};

use chrono::Local;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use log::info;

use crate::config::LoggingConfig;
use crate::error::{LayoutError, Result};

const DEFAULT_LOG_DIR: &str = "/var/tmp/unxrandr";

/// Start the global logger. Keep the returned handle alive until exit,
/// dropping it flushes and stops file logging.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggerHandle> {
    let spec = log_spec(std::env::var("RUST_LOG").ok(), config);

    let logger = Logger::try_with_str(&spec)
        .map_err(|e| LayoutError::config(format!("Failed to create logger: {}", e)))?
        .format_for_files(flexi_logger::detailed_format)
        .format_for_stderr(flexi_logger::colored_opt_format);

    if !config.log_to_file {
        return logger
            .log_to_stderr()
            .start()
            .map_err(|e| LayoutError::config(format!("Failed to start logger: {}", e)));
    }

    let log_dir = log_directory(config.log_dir.as_deref());
    let timestamp = Local::now().format("%Y-%m-%d_%H_%M_%S").to_string();
    let handle = logger
        .log_to_file(
            FileSpec::default()
                .directory(&log_dir)
                .basename(format!("unxrandr_{}", timestamp))
                .suffix("log"),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .rotate(
            Criterion::Size(config.max_file_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.max_files),
        )
        .start()
        .map_err(|e| LayoutError::config(format!("Failed to start logger: {}", e)))?;

    info!("Log directory: {}", log_dir.display());
    Ok(handle)
}

/// `RUST_LOG` wins over the configured level.
fn log_spec(env: Option<String>, config: &LoggingConfig) -> String {
    env.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.level.clone())
}

/// First usable directory out of the configured one and the default,
/// falling back to the working directory.
fn log_directory(configured: Option<&Path>) -> PathBuf {
    [configured.map(Path::to_path_buf), Some(PathBuf::from(DEFAULT_LOG_DIR))]
        .into_iter()
        .flatten()
        .find(|p| {
            std::fs::create_dir_all(p).ok();
            std::fs::metadata(p).map(|m| m.is_dir()).unwrap_or(false)
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

//! Configuration management

use crate::error::{LayoutError, Result};
use crate::reader::Backend;
use crate::serializer::Target;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "UNXRANDR_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub query: QueryConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Which display subsystem to query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// sway when `$SWAYSOCK` is set, X11 otherwise
    #[default]
    Auto,
    X11,
    Sway,
}

/// Order of the outputs in the snapshot and the generated command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputOrder {
    /// Lexicographic by identifier
    #[default]
    Name,
    /// As enumerated by the platform
    Platform,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Follow the backend: xrandr for X11, swaymsg for sway
    #[default]
    Auto,
    Xrandr,
    Swaymsg,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single command line
    #[default]
    Command,
    /// A `#!/bin/sh` script wrapping the command line
    Script,
}

/// State reader configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub backend: BackendKind,
    /// X11 display name, `$DISPLAY` when unset
    pub display: Option<String>,
    /// sway IPC socket, `$SWAYSOCK` when unset
    pub sway_socket: Option<PathBuf>,
    pub order: OutputOrder,
    pub ipc_timeout_ms: u64,
}

/// Command serializer configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub target: TargetKind,
    pub format: OutputFormat,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_to_file: bool,
    pub log_dir: Option<PathBuf>,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            display: None,
            sway_socket: None,
            order: OutputOrder::Name,
            ipc_timeout_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            log_to_file: false,
            log_dir: None,
            max_file_size: 10_000_000, // 10MB
            max_files: 5,
        }
    }
}

impl QueryConfig {
    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }

    /// sway socket from the config, falling back to `$SWAYSOCK`
    pub fn sway_socket(&self) -> Option<PathBuf> {
        self.sway_socket
            .clone()
            .or_else(|| std::env::var_os("SWAYSOCK").map(PathBuf::from))
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn resolve_backend(&self) -> Backend {
        match self.backend {
            BackendKind::X11 => Backend::X11,
            BackendKind::Sway => Backend::Sway,
            BackendKind::Auto if self.sway_socket().is_some() => Backend::Sway,
            BackendKind::Auto => Backend::X11,
        }
    }
}

impl TargetKind {
    pub fn resolve(self, backend: Backend) -> Target {
        match (self, backend) {
            (TargetKind::Xrandr, _) => Target::Xrandr,
            (TargetKind::Swaymsg, _) => Target::Swaymsg,
            (TargetKind::Auto, Backend::X11) => Target::Xrandr,
            (TargetKind::Auto, Backend::Sway) => Target::Swaymsg,
        }
    }
}

impl AppConfig {
    /// Load configuration from file, or defaults when there is none.
    ///
    /// A missing file is not created: running the tool must not leave
    /// anything behind.
    pub fn load() -> Result<Self> {
        match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                log::debug!("No configuration at {:?}, using defaults", path);
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LayoutError::config(format!("Failed to read config file {:?}: {}", path, e)))?;
        let config = Self::from_toml(&content)?;
        log::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get configuration file path
    pub fn config_file_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("unxrandr").join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.query.ipc_timeout_ms == 0 {
            return Err(LayoutError::config("query.ipc_timeout_ms must be positive"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(LayoutError::config("logging.level must not be empty"));
        }
        if self.logging.max_files == 0 {
            return Err(LayoutError::config("logging.max_files must be positive"));
        }
        Ok(())
    }
}

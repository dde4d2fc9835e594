//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format: `"json"` or `"pretty"`.
    #[serde(default = "default_format")]
    pub format: String,
    /// Optional rolling log file written alongside stderr.
    #[serde(default)]
    pub file: LogFileConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            file: LogFileConfig::default(),
        }
    }
}

/// The `[logging.file]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogFileConfig {
    /// Write log records to files as well as stderr.
    #[serde(default)]
    pub enabled: bool,
    /// Directory holding the log files. Created on startup if missing.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// How often a new file is started.
    #[serde(default)]
    pub rotation: LogRotation,
    /// File name prefix; the rotation suffix is appended after it.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_directory(),
            rotation: LogRotation::default(),
            prefix: default_prefix(),
        }
    }
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

fn default_directory() -> String {
    "./logs".to_string()
}

fn default_prefix() -> String {
    "assetdesk.log".to_string()
}

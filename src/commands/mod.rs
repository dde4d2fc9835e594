//! CLI command definitions and dispatch.

pub mod dir;
pub mod file;
pub mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use assetdesk_core::config::AppConfig;
use assetdesk_core::error::AppError;
use assetdesk_service::FileManager;

use crate::output::OutputFormat;

/// AssetDesk: directories, uploads, and search over a local asset library
#[derive(Debug, Parser)]
#[command(name = "assetdesk", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (defaults to config/default.toml plus the environment overlay)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    pub data_root: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Directory management
    Dir(dir::DirArgs),
    /// File management and uploads
    File(file::FileArgs),
    /// Storage statistics
    Stats,
    /// Remove interrupted writes and unreferenced content
    Sweep,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let manager = FileManager::open(config).await?;
        tracing::debug!(command = ?self.command, "Executing command");
        let result = match &self.command {
            Commands::Dir(args) => dir::execute(args, &manager, self.format).await,
            Commands::File(args) => file::execute(args, &manager, self.format).await,
            Commands::Stats => stats::execute(&manager, self.format).await,
            Commands::Sweep => stats::sweep(&manager, self.format).await,
        };
        manager.close().await;
        result
    }
}

/// Format a timestamp for table output
pub(crate) fn short_time(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

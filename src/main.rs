//! AssetDesk: a local asset library.
//!
//! Entry point that loads configuration, initializes logging, opens the
//! file manager, and dispatches the CLI command.

use clap::Parser;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use assetdesk_core::config::logging::{LogFileConfig, LogRotation};
use assetdesk_core::config::AppConfig;
use assetdesk_core::error::AppError;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    let log_guard = init_logging(&config);

    if let Err(e) = cli.execute(&config).await {
        output::print_error(&e.to_string());
        // `exit` skips destructors.
        drop(log_guard);
        std::process::exit(1);
    }
}

/// Load configuration from an explicit file, or from `config/` plus the
/// environment overlay selected by `ASSETDESK_ENV`.
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_file(path)?,
        None => {
            let env = std::env::var("ASSETDESK_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)?
        }
    };
    if let Some(data_root) = &cli.data_root {
        config.storage.data_root = data_root.display().to_string();
    }
    Ok(config)
}

/// Initialize tracing. Console logs go to stderr so command output stays
/// clean; `[logging.file]` adds a rolling file. Dropping the returned guard
/// flushes the file writer.
fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let json = config.logging.format == "json";

    let console = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file, guard) = match open_log_file(&config.logging.file) {
        Some((writer, guard)) => {
            let layer = if json {
                fmt::layer().json().with_writer(writer).boxed()
            } else {
                fmt::layer().with_ansi(false).with_writer(writer).boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    guard
}

fn open_log_file(file: &LogFileConfig) -> Option<(NonBlocking, WorkerGuard)> {
    if !file.enabled {
        return None;
    }
    let rotation = match file.rotation {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    };
    match RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file.prefix.as_str())
        .build(&file.directory)
    {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(e) => {
            eprintln!("File logging disabled, cannot open '{}': {e}", file.directory);
            None
        }
    }
}

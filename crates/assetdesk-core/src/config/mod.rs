//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field has a default so an empty file is a valid config.

pub mod database;
pub mod logging;
pub mod storage;
pub mod upload;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::database::DatabaseConfig;
use self::logging::LoggingConfig;
use self::storage::StorageConfig;
use self::upload::UploadConfig;

use crate::error::AppError;

/// Prefix for environment variable overrides (`ASSETDESK__UPLOAD__MAX_FILE_SIZE`).
const ENV_PREFIX: &str = "ASSETDESK";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data directory layout.
    #[serde(default)]
    pub storage: StorageConfig,
    /// SQLite connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload limits and concurrency.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with `config/{env}.toml` and environment
    /// variables prefixed with `ASSETDESK__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        Self::finish(builder)
    }

    /// Load configuration from one explicit file plus environment overrides.
    pub fn load_file(path: &Path) -> Result<Self, AppError> {
        let builder = config::Config::builder().add_source(config::File::from(path).required(true));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upload.allowed_file_types")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the subsystem cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.upload.max_concurrent_uploads == 0 {
            return Err(AppError::configuration(
                "upload.max_concurrent_uploads must be at least 1",
            ));
        }
        if self.upload.chunk_size_bytes == 0 {
            return Err(AppError::configuration(
                "upload.chunk_size_bytes must be greater than zero",
            ));
        }
        if self.upload.max_batch_size == 0 {
            return Err(AppError::configuration(
                "upload.max_batch_size must be at least 1",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::configuration(
                "database.max_connections must be at least 1",
            ));
        }
        Ok(())
    }
}

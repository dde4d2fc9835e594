//! Data directory configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the metadata database and content blobs live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all runtime data.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// SQLite database file name, relative to `data_root`.
    #[serde(default = "default_database_file")]
    pub database_file: String,
    /// Content directory name, relative to `data_root`.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
}

impl StorageConfig {
    /// Build a config rooted at the given directory with default file names.
    pub fn rooted_at(data_root: impl Into<String>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    /// Absolute (or cwd-relative) path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_root).join(&self.database_file)
    }

    /// Absolute (or cwd-relative) path of the content root.
    pub fn content_root(&self) -> PathBuf {
        PathBuf::from(&self.data_root).join(&self.content_dir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            database_file: default_database_file(),
            content_dir: default_content_dir(),
        }
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_database_file() -> String {
    "assetdesk.db".to_string()
}

fn default_content_dir() -> String {
    "content".to_string()
}

//! Aggregate storage statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Totals over every directory and file record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Number of file records.
    pub total_files: u64,
    /// Number of directory records.
    pub total_directories: u64,
    /// Sum of all file sizes in bytes.
    pub total_size: u64,
    /// Size of the largest file in bytes.
    pub largest_file_size: u64,
    /// When the most recent file was uploaded.
    pub most_recent_upload: Option<DateTime<Utc>>,
}

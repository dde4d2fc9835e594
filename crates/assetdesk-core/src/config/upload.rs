//! Upload limits and concurrency configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to every upload candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum file size in bytes (default 100 MiB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed file extensions or MIME patterns (`png`, `image/*`).
    /// An empty list allows every type.
    #[serde(default = "default_allowed_file_types")]
    pub allowed_file_types: Vec<String>,
    /// Maximum number of transfers running at once.
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    /// Size of each write while streaming content (default 64 KiB).
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
    /// Maximum number of files accepted by one batch enqueue.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_file_types: default_allowed_file_types(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
            chunk_size_bytes: default_chunk_size(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_max_file_size() -> u64 {
    104_857_600 // 100 MiB
}

fn default_allowed_file_types() -> Vec<String> {
    [
        "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "tiff", "tga", "pdf", "txt", "md",
        "doc", "docx", "zip", "rar", "7z",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_concurrent_uploads() -> usize {
    3
}

fn default_chunk_size() -> usize {
    65_536 // 64 KiB
}

fn default_max_batch_size() -> usize {
    50
}

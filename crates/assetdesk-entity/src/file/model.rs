//! File entity model.

use assetdesk_core::mime::extension_of;
use assetdesk_core::types::{DirectoryId, FileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A file indexed by AssetDesk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    /// Unique file identifier.
    pub id: FileId,
    /// The name the file was uploaded as.
    pub name: String,
    /// The directory containing this file.
    pub directory_id: DirectoryId,
    /// Blob path within the content store.
    pub content_path: String,
    /// File size in bytes.
    pub size: i64,
    /// MIME type of the file.
    pub mime_type: String,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last modified.
    pub modified_at: DateTime<Utc>,
}

impl FileRecord {
    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// Size in bytes as an unsigned value.
    pub fn size_bytes(&self) -> u64 {
        u64::try_from(self.size).unwrap_or(0)
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The file name.
    pub name: String,
    /// The directory to place the file in.
    pub directory_id: DirectoryId,
    /// Blob path returned by the content store.
    pub content_path: String,
    /// File size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
}

//! Listing entries shared by sorting, filtering, and selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetdesk_core::mime::DIRECTORY_MIME;
use assetdesk_core::types::{DirectoryId, FileId};
use assetdesk_entity::directory::{DirectoryRecord, DirectoryTreeNode};
use assetdesk_entity::file::FileRecord;

/// Identity of an entry in a mixed listing. Directories order before files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntryId {
    /// A directory.
    Directory(DirectoryId),
    /// A file.
    File(FileId),
}

/// Anything that can appear in a listing.
pub trait Listable {
    /// Stable identity, used to break ordering ties.
    fn entry_id(&self) -> EntryId;
    /// Display name.
    fn name(&self) -> &str;
    /// Size in bytes; directories report 0.
    fn size(&self) -> u64;
    /// MIME type; directories report `inode/directory`.
    fn type_key(&self) -> &str;
    /// Creation time.
    fn created_at(&self) -> DateTime<Utc>;
    /// Last modification time.
    fn modified_at(&self) -> DateTime<Utc>;
}

impl Listable for FileRecord {
    fn entry_id(&self) -> EntryId {
        EntryId::File(self.id)
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn size(&self) -> u64 {
        self.size_bytes()
    }
    fn type_key(&self) -> &str {
        &self.mime_type
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}

impl Listable for DirectoryRecord {
    fn entry_id(&self) -> EntryId {
        EntryId::Directory(self.id)
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn size(&self) -> u64 {
        0
    }
    fn type_key(&self) -> &str {
        DIRECTORY_MIME
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Listable for DirectoryTreeNode {
    fn entry_id(&self) -> EntryId {
        EntryId::Directory(self.id)
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn size(&self) -> u64 {
        0
    }
    fn type_key(&self) -> &str {
        DIRECTORY_MIME
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// A file or a directory in a mixed listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ListEntry {
    /// A child directory.
    Directory(DirectoryRecord),
    /// A file.
    File(FileRecord),
}

impl ListEntry {
    fn inner(&self) -> &dyn Listable {
        match self {
            Self::Directory(dir) => dir,
            Self::File(file) => file,
        }
    }

    /// Whether this entry is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }
}

impl Listable for ListEntry {
    fn entry_id(&self) -> EntryId {
        self.inner().entry_id()
    }
    fn name(&self) -> &str {
        self.inner().name()
    }
    fn size(&self) -> u64 {
        self.inner().size()
    }
    fn type_key(&self) -> &str {
        self.inner().type_key()
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.inner().created_at()
    }
    fn modified_at(&self) -> DateTime<Utc> {
        self.inner().modified_at()
    }
}

impl From<DirectoryRecord> for ListEntry {
    fn from(record: DirectoryRecord) -> Self {
        Self::Directory(record)
    }
}

impl From<FileRecord> for ListEntry {
    fn from(record: FileRecord) -> Self {
        Self::File(record)
    }
}

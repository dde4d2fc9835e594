//! File queries, deletion, and content maintenance.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use assetdesk_core::error::{AppError, ErrorKind};
use assetdesk_core::result::AppResult;
use assetdesk_core::traits::ContentStore;
use assetdesk_core::types::{DirectoryId, FileId};
use assetdesk_database::MetadataStore;
use assetdesk_entity::file::FileRecord;
use assetdesk_entity::stats::StorageStats;

use crate::directory::DirectoryIndex;

/// Outcome of a content sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepReport {
    /// Partial writes removed from the temp area.
    pub temp_files: usize,
    /// Blobs no record pointed at.
    pub orphaned_blobs: usize,
}

/// Handles file listing, search, reads, and deletion.
#[derive(Debug, Clone)]
pub struct FileService {
    /// Metadata store.
    store: MetadataStore,
    /// Content store.
    content: Arc<dyn ContentStore>,
    /// Directory index, refreshed when file counts change.
    index: DirectoryIndex,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(store: MetadataStore, content: Arc<dyn ContentStore>, index: DirectoryIndex) -> Self {
        Self {
            store,
            content,
            index,
        }
    }

    /// Files directly inside a directory, ordered by name.
    pub async fn list_files(&self, directory_id: DirectoryId) -> AppResult<Vec<FileRecord>> {
        self.store.list_files(directory_id).await
    }

    /// Case-insensitive name search, optionally scoped to one directory.
    pub async fn search_files(
        &self,
        query: &str,
        directory_id: Option<DirectoryId>,
    ) -> AppResult<Vec<FileRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("search_files: query must not be blank"));
        }
        self.store.search(query, directory_id).await
    }

    /// Find a file record.
    pub async fn get_file(&self, id: FileId) -> AppResult<FileRecord> {
        self.store
            .get_file(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("file {id} not found")))
    }

    /// Read the full content of a file.
    pub async fn read_file_content(&self, id: FileId) -> AppResult<Bytes> {
        let record = self.get_file(id).await?;
        self.content.read(&record.content_path).await
    }

    /// Delete a file record, then its blob.
    pub async fn delete_file(&self, id: FileId) -> AppResult<()> {
        let content_path = self.store.delete_file(id).await?;
        // The record is gone whatever happens to the blob.
        let removed = self.content.delete(&content_path).await;
        self.index.refresh().await?;
        match removed {
            Ok(()) => {}
            Err(e) if e.is(ErrorKind::NotFound) => {
                warn!(file_id = %id, content_path = %content_path, "Blob was already missing");
            }
            Err(e) => {
                warn!(file_id = %id, content_path = %content_path, error = %e, "Failed to delete blob");
                return Err(e);
            }
        }
        info!(file_id = %id, content_path = %content_path, "File deleted");
        Ok(())
    }

    /// Delete blobs whose records are already gone. Missing blobs are skipped.
    pub async fn delete_blobs(&self, content_paths: &[String]) -> usize {
        let mut deleted = 0;
        for path in content_paths {
            match self.content.delete(path).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!(content_path = %path, error = %e, "Failed to delete blob"),
            }
        }
        deleted
    }

    /// Totals over all file and directory records.
    pub async fn storage_stats(&self) -> AppResult<StorageStats> {
        self.store.storage_stats().await
    }

    /// Remove temp leftovers and blobs that no record references.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let temp_files = self.content.sweep_temp().await?;
        let referenced = self.store.referenced_content_paths().await?;
        let orphans: Vec<String> = self
            .content
            .list_blobs()
            .await?
            .into_iter()
            .filter(|path| !referenced.contains(path))
            .collect();
        let orphaned_blobs = self.delete_blobs(&orphans).await;

        if temp_files > 0 || orphaned_blobs > 0 {
            info!(temp_files, orphaned_blobs, "Content store swept");
        }
        Ok(SweepReport {
            temp_files,
            orphaned_blobs,
        })
    }
}

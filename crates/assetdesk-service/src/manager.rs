//! The file manager command API.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use assetdesk_core::config::AppConfig;
use assetdesk_core::result::AppResult;
use assetdesk_core::traits::ContentStore;
use assetdesk_core::types::{DirectoryId, FileId, UploadId};
use assetdesk_database::{run_migrations, DatabasePool, MetadataStore};
use assetdesk_entity::directory::{DirectoryRecord, DirectoryTreeNode};
use assetdesk_entity::file::FileRecord;
use assetdesk_entity::stats::StorageStats;
use assetdesk_storage::LocalContentStore;

use crate::directory::DirectoryIndex;
use crate::file::{ContentIngest, FileService, SweepReport};
use crate::query::ListEntry;
use crate::upload::{UploadCoordinator, UploadSource};

/// Owns every file manager component and exposes the commands.
#[derive(Debug, Clone)]
pub struct FileManager {
    db: DatabasePool,
    index: DirectoryIndex,
    ingest: ContentIngest,
    files: FileService,
    uploads: UploadCoordinator,
}

impl FileManager {
    /// Open the data directory described by `config`, creating it if needed.
    ///
    /// Migrations are applied and leftovers from interrupted writes are
    /// swept before the manager is returned.
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        let db = DatabasePool::connect(&config.storage.database_path(), &config.database).await?;
        run_migrations(db.pool()).await?;
        let content = Arc::new(LocalContentStore::new(config.storage.content_root()).await?);

        let manager = Self::from_parts(db, content, config).await?;
        let swept = manager.files.sweep().await?;
        info!(
            data_root = %config.storage.data_root,
            directories = manager.index.len(),
            temp_files = swept.temp_files,
            orphaned_blobs = swept.orphaned_blobs,
            "File manager ready"
        );
        Ok(manager)
    }

    /// Assemble a manager over an already-migrated database and a content store.
    pub async fn from_parts(
        db: DatabasePool,
        content: Arc<dyn ContentStore>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let store = MetadataStore::new(&db);
        let index = DirectoryIndex::load(store.clone()).await?;
        let ingest = ContentIngest::new(store.clone(), content.clone(), config.upload.max_file_size);
        let files = FileService::new(store, content, index.clone());
        let uploads = UploadCoordinator::new(ingest.clone(), index.clone(), &config.upload);
        Ok(Self {
            db,
            index,
            ingest,
            files,
            uploads,
        })
    }

    /// The directory index.
    pub fn index(&self) -> &DirectoryIndex {
        &self.index
    }

    /// The upload coordinator.
    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    // -- Directories -------------------------------------------------------

    /// Create a directory under `parent_id`, or at the root level.
    pub async fn create_directory(
        &self,
        name: &str,
        parent_id: Option<DirectoryId>,
    ) -> AppResult<DirectoryRecord> {
        self.index.create_directory(name, parent_id).await
    }

    /// Delete an empty directory.
    pub async fn delete_directory(&self, id: DirectoryId) -> AppResult<()> {
        self.index.delete_directory(id).await
    }

    /// Delete a directory with everything in it. Returns the number of files removed.
    pub async fn delete_directory_recursive(&self, id: DirectoryId) -> AppResult<usize> {
        let content_paths = self.index.delete_directory_recursive(id).await?;
        self.files.delete_blobs(&content_paths).await;
        Ok(content_paths.len())
    }

    /// Rename a directory.
    pub async fn rename_directory(&self, id: DirectoryId, new_name: &str) -> AppResult<DirectoryRecord> {
        self.index.rename_directory(id, new_name).await
    }

    /// Move a directory under a new parent, or to the root level.
    pub async fn move_directory(
        &self,
        id: DirectoryId,
        new_parent_id: Option<DirectoryId>,
    ) -> AppResult<DirectoryRecord> {
        self.index.move_directory(id, new_parent_id).await
    }

    /// Find a directory.
    pub async fn get_directory(&self, id: DirectoryId) -> AppResult<DirectoryRecord> {
        self.index.ensure_exists(id).await
    }

    /// The whole directory forest with child and file counts.
    pub async fn get_directory_tree(&self) -> AppResult<Vec<DirectoryTreeNode>> {
        self.index.refresh().await?;
        Ok(self.index.tree())
    }

    // -- Files -------------------------------------------------------------

    /// Store `data` as a new file in `directory_id`.
    pub async fn upload_file(
        &self,
        data: Bytes,
        original_name: &str,
        directory_id: DirectoryId,
    ) -> AppResult<FileRecord> {
        self.uploads.policy().check(original_name, data.len() as u64)?;
        self.index.ensure_exists(directory_id).await?;
        let record = self.ingest.ingest_bytes(original_name, directory_id, data).await?;
        self.index.refresh().await?;
        Ok(record)
    }

    /// Queue many sources for upload into `directory_id`.
    pub async fn enqueue_uploads(
        &self,
        sources: Vec<UploadSource>,
        directory_id: DirectoryId,
    ) -> AppResult<Vec<UploadId>> {
        self.uploads.enqueue(sources, directory_id).await
    }

    /// Delete a file and its content.
    pub async fn delete_file(&self, id: FileId) -> AppResult<()> {
        self.files.delete_file(id).await
    }

    /// Find a file.
    pub async fn get_file(&self, id: FileId) -> AppResult<FileRecord> {
        self.files.get_file(id).await
    }

    /// Read a file's content.
    pub async fn read_file_content(&self, id: FileId) -> AppResult<Bytes> {
        self.files.read_file_content(id).await
    }

    /// Files directly inside a directory.
    pub async fn list_files(&self, directory_id: DirectoryId) -> AppResult<Vec<FileRecord>> {
        self.files.list_files(directory_id).await
    }

    /// Child directories followed by files. Without a directory, lists the roots.
    pub async fn list_entries(&self, directory_id: Option<DirectoryId>) -> AppResult<Vec<ListEntry>> {
        let mut entries: Vec<ListEntry> = match directory_id {
            Some(id) => {
                self.index.ensure_exists(id).await?;
                self.index.children(Some(id))
            }
            None => self.index.children(None),
        }
        .into_iter()
        .map(ListEntry::from)
        .collect();

        if let Some(id) = directory_id {
            entries.extend(self.files.list_files(id).await?.into_iter().map(ListEntry::from));
        }
        Ok(entries)
    }

    /// Case-insensitive name search. A blank query is rejected.
    pub async fn search_files(
        &self,
        query: &str,
        directory_id: Option<DirectoryId>,
    ) -> AppResult<Vec<FileRecord>> {
        self.files.search_files(query, directory_id).await
    }

    /// Totals over every record.
    pub async fn get_storage_stats(&self) -> AppResult<StorageStats> {
        self.files.storage_stats().await
    }

    /// Whether a file name passes the configured type allowlist.
    pub fn validate_file_type(&self, name: &str) -> bool {
        self.uploads.policy().is_allowed_type(name)
    }

    // -- Maintenance -------------------------------------------------------

    /// Remove partial writes and unreferenced blobs.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        self.files.sweep().await
    }

    /// Check the database and content store.
    pub async fn health_check(&self) -> AppResult<bool> {
        Ok(self.db.health_check().await? && self.ingest.content().health_check().await?)
    }

    /// Wait for uploads to settle, then close the database.
    pub async fn close(&self) {
        self.uploads.wait_idle().await;
        self.db.close().await;
    }
}

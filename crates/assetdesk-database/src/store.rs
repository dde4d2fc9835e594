//! Transactional metadata store.
//!
//! Every mutation runs inside one SQLite transaction and writers are
//! serialized through an async mutex, so a failed operation leaves no
//! partial rows behind and path uniqueness is decided by the `UNIQUE`
//! index within the same transaction that writes the row.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info};

use assetdesk_core::error::{AppError, ErrorKind};
use assetdesk_core::result::AppResult;
use assetdesk_core::types::text::contains_ignore_case;
use assetdesk_core::types::{DirectoryId, FileId};
use assetdesk_entity::directory::{CreateDirectory, DirectoryRecord};
use assetdesk_entity::file::{CreateFile, FileRecord};
use assetdesk_entity::stats::StorageStats;

use crate::connection::DatabasePool;
use crate::repositories::{DirectoryRepository, FileRepository};

/// Authoritative store of directory and file records.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    pool: SqlitePool,
    directories: DirectoryRepository,
    files: FileRepository,
    write_lock: Arc<Mutex<()>>,
}

impl MetadataStore {
    /// Create a store over an open database.
    pub fn new(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            directories: DirectoryRepository::new(pool.clone()),
            files: FileRepository::new(pool.clone()),
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn begin(&self, operation: &str) -> AppResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Store,
                format!("{operation}: failed to begin transaction"),
                e,
            )
        })
    }

    async fn commit(tx: Transaction<'static, Sqlite>, operation: &str) -> AppResult<()> {
        tx.commit().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Store,
                format!("{operation}: failed to commit transaction"),
                e,
            )
        })
    }

    // -- Directories -------------------------------------------------------

    /// Create a directory under `parent_id` (or as a root).
    pub async fn create_directory(&self, input: &CreateDirectory) -> AppResult<DirectoryRecord> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin("create_directory").await?;

        let parent_path = match input.parent_id {
            Some(parent_id) => {
                let parent = DirectoryRepository::find_by_id_in(&mut tx, parent_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!(
                            "create_directory '{}': parent directory {parent_id} not found",
                            input.name
                        ))
                    })?;
                Some(parent.full_path)
            }
            None => None,
        };

        let now = Utc::now();
        let record = DirectoryRecord {
            id: DirectoryId::new(),
            name: input.name.clone(),
            parent_id: input.parent_id,
            full_path: DirectoryRecord::join_path(parent_path.as_deref(), &input.name),
            created_at: now,
            updated_at: now,
        };
        DirectoryRepository::insert_in(&mut tx, &record).await?;
        Self::commit(tx, "create_directory").await?;

        info!(directory_id = %record.id, path = %record.full_path, "Directory created");
        Ok(record)
    }

    /// Delete an empty directory.
    pub async fn delete_directory(&self, id: DirectoryId) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin("delete_directory").await?;

        let record = DirectoryRepository::find_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("delete_directory: directory {id} not found")))?;

        let children = DirectoryRepository::count_children_in(&mut tx, id).await?;
        let files = FileRepository::count_in_directory_in(&mut tx, id).await?;
        if children > 0 || files > 0 {
            return Err(AppError::not_empty(format!(
                "delete_directory {}: contains {children} subdirector{} and {files} file{}",
                record.full_path,
                if children == 1 { "y" } else { "ies" },
                if files == 1 { "" } else { "s" },
            )));
        }

        DirectoryRepository::delete_in(&mut tx, id).await?;
        Self::commit(tx, "delete_directory").await?;

        info!(directory_id = %id, path = %record.full_path, "Directory deleted");
        Ok(())
    }

    /// Delete a directory, its descendants, and every file record inside them.
    ///
    /// Returns the content paths of the removed files so the caller can
    /// delete the blobs once the transaction has committed.
    pub async fn delete_directory_recursive(&self, id: DirectoryId) -> AppResult<Vec<String>> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin("delete_directory_recursive").await?;

        let subtree = DirectoryRepository::subtree_in(&mut tx, id).await?;
        let Some(root) = subtree.first().cloned() else {
            return Err(AppError::not_found(format!(
                "delete_directory_recursive: directory {id} not found"
            )));
        };

        let mut content_paths = Vec::new();
        for dir in &subtree {
            content_paths.extend(FileRepository::content_paths_in(&mut tx, dir.id).await?);
            FileRepository::delete_by_directory_in(&mut tx, dir.id).await?;
        }
        // Path order puts parents first; delete children before their parent.
        for dir in subtree.iter().rev() {
            DirectoryRepository::delete_in(&mut tx, dir.id).await?;
        }
        Self::commit(tx, "delete_directory_recursive").await?;

        info!(
            directory_id = %id,
            path = %root.full_path,
            directories = subtree.len(),
            files = content_paths.len(),
            "Directory tree deleted"
        );
        Ok(content_paths)
    }

    /// Rename a directory, regenerating the paths of its descendants.
    pub async fn rename_directory(
        &self,
        id: DirectoryId,
        new_name: &str,
    ) -> AppResult<DirectoryRecord> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin("rename_directory").await?;

        let record = DirectoryRepository::find_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("rename_directory: directory {id} not found")))?;
        if record.name == new_name {
            return Ok(record);
        }

        let parent_path = record
            .full_path
            .rsplit_once('/')
            .map(|(prefix, _)| prefix)
            .filter(|prefix| !prefix.is_empty());
        let new_path = DirectoryRecord::join_path(parent_path, new_name);

        let updated =
            Self::relocate_in(&mut tx, &record, new_name, record.parent_id, &new_path).await?;
        Self::commit(tx, "rename_directory").await?;

        info!(directory_id = %id, from = %record.full_path, to = %updated.full_path, "Directory renamed");
        Ok(updated)
    }

    /// Move a directory under a new parent (or to the root level).
    pub async fn move_directory(
        &self,
        id: DirectoryId,
        new_parent_id: Option<DirectoryId>,
    ) -> AppResult<DirectoryRecord> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin("move_directory").await?;

        let record = DirectoryRepository::find_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("move_directory: directory {id} not found")))?;
        if record.parent_id == new_parent_id {
            return Ok(record);
        }

        let parent_path = match new_parent_id {
            Some(parent_id) => {
                let subtree = DirectoryRepository::subtree_in(&mut tx, id).await?;
                if subtree.iter().any(|d| d.id == parent_id) {
                    return Err(AppError::validation(format!(
                        "move_directory {}: cannot move a directory into itself or a descendant",
                        record.full_path
                    )));
                }
                let parent = DirectoryRepository::find_by_id_in(&mut tx, parent_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!(
                            "move_directory {}: target directory {parent_id} not found",
                            record.full_path
                        ))
                    })?;
                Some(parent.full_path)
            }
            None => None,
        };
        let new_path = DirectoryRecord::join_path(parent_path.as_deref(), &record.name);

        let updated =
            Self::relocate_in(&mut tx, &record, &record.name, new_parent_id, &new_path).await?;
        Self::commit(tx, "move_directory").await?;

        info!(directory_id = %id, from = %record.full_path, to = %updated.full_path, "Directory moved");
        Ok(updated)
    }

    /// Rewrite the placement of `record` and the paths of its descendants.
    async fn relocate_in(
        tx: &mut Transaction<'static, Sqlite>,
        record: &DirectoryRecord,
        new_name: &str,
        new_parent_id: Option<DirectoryId>,
        new_path: &str,
    ) -> AppResult<DirectoryRecord> {
        let subtree = DirectoryRepository::subtree_in(&mut **tx, record.id).await?;
        let now = Utc::now();
        let old_prefix = record.full_path.as_str();

        DirectoryRepository::update_placement_in(&mut **tx, record.id, new_name, new_parent_id, new_path, now)
            .await?;
        for dir in subtree.iter().filter(|d| d.id != record.id) {
            let suffix = dir.full_path.strip_prefix(old_prefix).ok_or_else(|| {
                AppError::store(format!(
                    "directory {} path '{}' is not under '{}'",
                    dir.id, dir.full_path, old_prefix
                ))
            })?;
            let path = format!("{new_path}{suffix}");
            debug!(directory_id = %dir.id, path = %path, "Rewriting descendant path");
            DirectoryRepository::update_placement_in(&mut **tx, dir.id, &dir.name, dir.parent_id, &path, now)
                .await?;
        }

        Ok(DirectoryRecord {
            name: new_name.to_string(),
            parent_id: new_parent_id,
            full_path: new_path.to_string(),
            updated_at: now,
            ..record.clone()
        })
    }

    /// Find a directory by ID.
    pub async fn get_directory(&self, id: DirectoryId) -> AppResult<Option<DirectoryRecord>> {
        self.directories.find_by_id(id).await
    }

    /// Find a directory by its full path.
    pub async fn find_directory_by_path(&self, full_path: &str) -> AppResult<Option<DirectoryRecord>> {
        self.directories.find_by_path(full_path).await
    }

    /// Every directory ordered by path, so parents precede their children.
    pub async fn list_tree(&self) -> AppResult<Vec<DirectoryRecord>> {
        self.directories.find_all().await
    }

    // -- Files -------------------------------------------------------------

    /// Create a file record for an already-stored blob.
    pub async fn create_file(&self, input: &CreateFile) -> AppResult<FileRecord> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin("create_file").await?;

        if DirectoryRepository::find_by_id_in(&mut tx, input.directory_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(format!(
                "create_file '{}': directory {} not found",
                input.name, input.directory_id
            )));
        }

        let now = Utc::now();
        let record = FileRecord {
            id: FileId::new(),
            name: input.name.clone(),
            directory_id: input.directory_id,
            content_path: input.content_path.clone(),
            size: input.size,
            mime_type: input.mime_type.clone(),
            created_at: now,
            modified_at: now,
        };
        FileRepository::insert_in(&mut tx, &record).await?;
        Self::commit(tx, "create_file").await?;

        info!(
            file_id = %record.id,
            directory_id = %record.directory_id,
            name = %record.name,
            size = record.size,
            "File record created"
        );
        Ok(record)
    }

    /// Delete a file record and return the content path it pointed at.
    pub async fn delete_file(&self, id: FileId) -> AppResult<String> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin("delete_file").await?;

        let record = FileRepository::find_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("delete_file: file {id} not found")))?;
        FileRepository::delete_in(&mut tx, id).await?;
        Self::commit(tx, "delete_file").await?;

        info!(file_id = %id, name = %record.name, "File record deleted");
        Ok(record.content_path)
    }

    /// Find a file by ID.
    pub async fn get_file(&self, id: FileId) -> AppResult<Option<FileRecord>> {
        self.files.find_by_id(id).await
    }

    /// Files in a directory ordered by name. Fails if the directory is unknown.
    pub async fn list_files(&self, directory_id: DirectoryId) -> AppResult<Vec<FileRecord>> {
        if self.directories.find_by_id(directory_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "list_files: directory {directory_id} not found"
            )));
        }
        self.files.find_by_directory(directory_id).await
    }

    /// Files whose name contains `query`, ignoring case, optionally scoped
    /// to one directory.
    pub async fn search(
        &self,
        query: &str,
        directory_id: Option<DirectoryId>,
    ) -> AppResult<Vec<FileRecord>> {
        let candidates = match directory_id {
            Some(directory_id) => self.list_files(directory_id).await?,
            None => self.files.find_all().await?,
        };
        Ok(candidates
            .into_iter()
            .filter(|file| contains_ignore_case(&file.name, query))
            .collect())
    }

    /// Number of files directly inside each directory.
    pub async fn file_counts(&self) -> AppResult<HashMap<DirectoryId, u64>> {
        self.files.count_by_directory().await
    }

    /// Totals over all records.
    pub async fn storage_stats(&self) -> AppResult<StorageStats> {
        self.files.stats().await
    }

    /// Content paths referenced by any file record.
    pub async fn referenced_content_paths(&self) -> AppResult<HashSet<String>> {
        Ok(self
            .files
            .find_all()
            .await?
            .into_iter()
            .map(|f| f.content_path)
            .collect())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Health check failed", e))
    }
}

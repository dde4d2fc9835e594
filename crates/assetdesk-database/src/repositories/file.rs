//! File repository implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use assetdesk_core::error::{AppError, ErrorKind};
use assetdesk_core::result::AppResult;
use assetdesk_core::types::{DirectoryId, FileId};
use assetdesk_entity::file::FileRecord;
use assetdesk_entity::stats::StorageStats;

use super::{is_foreign_key_violation, is_unique_violation};

/// Repository for file record rows.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to find file", e))
    }

    /// List files in a directory ordered by name, then id.
    pub async fn find_by_directory(&self, directory_id: DirectoryId) -> AppResult<Vec<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files WHERE directory_id = ? ORDER BY name COLLATE NOCASE ASC, id ASC",
        )
        .bind(directory_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to list files", e))
    }

    /// List every file ordered by name, then id.
    pub async fn find_all(&self) -> AppResult<Vec<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files ORDER BY name COLLATE NOCASE ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to list files", e))
    }

    /// Number of files per directory. Directories without files are absent.
    pub async fn count_by_directory(&self) -> AppResult<HashMap<DirectoryId, u64>> {
        let rows: Vec<(DirectoryId, i64)> =
            sqlx::query_as("SELECT directory_id, COUNT(*) FROM files GROUP BY directory_id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Store, "Failed to count files", e)
                })?;
        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count as u64))
            .collect())
    }

    /// Aggregate totals over all file and directory rows.
    pub async fn stats(&self) -> AppResult<StorageStats> {
        let (total_files, total_size, largest): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(size), 0), COALESCE(MAX(size), 0) FROM files",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to compute file stats", e))?;

        let total_directories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM directories")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Store, "Failed to count directories", e)
            })?;

        let most_recent_upload: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT created_at FROM files ORDER BY created_at DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Store, "Failed to find latest upload", e)
                })?;

        Ok(StorageStats {
            total_files: total_files as u64,
            total_directories: total_directories as u64,
            total_size: total_size as u64,
            largest_file_size: largest as u64,
            most_recent_upload,
        })
    }

    pub(crate) async fn find_by_id_in(
        conn: &mut SqliteConnection,
        id: FileId,
    ) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to find file", e))
    }

    pub(crate) async fn insert_in(conn: &mut SqliteConnection, record: &FileRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO files \
             (id, name, directory_id, content_path, size, mime_type, created_at, modified_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(record.directory_id)
        .bind(&record.content_path)
        .bind(record.size)
        .bind(&record.mime_type)
        .bind(record.created_at)
        .bind(record.modified_at)
        .execute(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::name_conflict(format!(
                    "create_file '{}': content path '{}' is already in use",
                    record.name, record.content_path
                ))
            } else if is_foreign_key_violation(&e) {
                AppError::not_found(format!(
                    "create_file '{}': directory {} not found",
                    record.name, record.directory_id
                ))
            } else {
                AppError::with_source(ErrorKind::Store, "Failed to create file record", e)
            }
        })?;
        Ok(())
    }

    pub(crate) async fn count_in_directory_in(
        conn: &mut SqliteConnection,
        directory_id: DirectoryId,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE directory_id = ?")
            .bind(directory_id)
            .fetch_one(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to count files", e))?;
        Ok(count as u64)
    }

    /// Content paths of the files in one directory.
    pub(crate) async fn content_paths_in(
        conn: &mut SqliteConnection,
        directory_id: DirectoryId,
    ) -> AppResult<Vec<String>> {
        sqlx::query_scalar("SELECT content_path FROM files WHERE directory_id = ?")
            .bind(directory_id)
            .fetch_all(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Store, "Failed to list content paths", e)
            })
    }

    pub(crate) async fn delete_in(conn: &mut SqliteConnection, id: FileId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn delete_by_directory_in(
        conn: &mut SqliteConnection,
        directory_id: DirectoryId,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM files WHERE directory_id = ?")
            .bind(directory_id)
            .execute(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to delete files", e))?;
        Ok(result.rows_affected())
    }
}

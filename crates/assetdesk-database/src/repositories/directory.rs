//! Directory repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use assetdesk_core::error::{AppError, ErrorKind};
use assetdesk_core::result::AppResult;
use assetdesk_core::types::DirectoryId;
use assetdesk_entity::directory::DirectoryRecord;

use super::is_unique_violation;

const SUBTREE_QUERY: &str = "WITH RECURSIVE subtree(id) AS ( \
        SELECT id FROM directories WHERE id = ? \
        UNION ALL \
        SELECT d.id FROM directories d INNER JOIN subtree s ON d.parent_id = s.id \
     ) \
     SELECT d.* FROM directories d INNER JOIN subtree s ON d.id = s.id ORDER BY d.full_path ASC";

/// Repository for directory rows and hierarchy queries.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: SqlitePool,
}

impl DirectoryRepository {
    /// Create a new directory repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a directory by ID.
    pub async fn find_by_id(&self, id: DirectoryId) -> AppResult<Option<DirectoryRecord>> {
        sqlx::query_as::<_, DirectoryRecord>("SELECT * FROM directories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to find directory", e))
    }

    /// Find a directory by its full path.
    pub async fn find_by_path(&self, full_path: &str) -> AppResult<Option<DirectoryRecord>> {
        sqlx::query_as::<_, DirectoryRecord>("SELECT * FROM directories WHERE full_path = ?")
            .bind(full_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Store, "Failed to find directory by path", e)
            })
    }

    /// List every directory, parents before children.
    pub async fn find_all(&self) -> AppResult<Vec<DirectoryRecord>> {
        sqlx::query_as::<_, DirectoryRecord>("SELECT * FROM directories ORDER BY full_path ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to list directories", e))
    }

    /// Count all directories.
    pub async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM directories")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Store, "Failed to count directories", e)
            })?;
        Ok(count as u64)
    }

    pub(crate) async fn find_by_id_in(
        conn: &mut SqliteConnection,
        id: DirectoryId,
    ) -> AppResult<Option<DirectoryRecord>> {
        sqlx::query_as::<_, DirectoryRecord>("SELECT * FROM directories WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to find directory", e))
    }

    pub(crate) async fn insert_in(
        conn: &mut SqliteConnection,
        record: &DirectoryRecord,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO directories (id, name, parent_id, full_path, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(record.parent_id)
        .bind(&record.full_path)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::name_conflict(format!(
                    "create_directory '{}': path '{}' already exists",
                    record.name, record.full_path
                ))
            } else {
                AppError::with_source(ErrorKind::Store, "Failed to create directory", e)
            }
        })?;
        Ok(())
    }

    pub(crate) async fn count_children_in(
        conn: &mut SqliteConnection,
        id: DirectoryId,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM directories WHERE parent_id = ?")
            .bind(id)
            .fetch_one(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Store, "Failed to count subdirectories", e)
            })?;
        Ok(count as u64)
    }

    /// The directory and all of its descendants, ordered by path.
    pub(crate) async fn subtree_in(
        conn: &mut SqliteConnection,
        id: DirectoryId,
    ) -> AppResult<Vec<DirectoryRecord>> {
        sqlx::query_as::<_, DirectoryRecord>(SUBTREE_QUERY)
            .bind(id)
            .fetch_all(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Failed to load subtree", e))
    }

    pub(crate) async fn update_placement_in(
        conn: &mut SqliteConnection,
        id: DirectoryId,
        name: &str,
        parent_id: Option<DirectoryId>,
        full_path: &str,
        updated_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE directories SET name = ?, parent_id = ?, full_path = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(name)
        .bind(parent_id)
        .bind(full_path)
        .bind(updated_at)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::name_conflict(format!("path '{full_path}' already exists"))
            } else {
                AppError::with_source(ErrorKind::Store, "Failed to update directory", e)
            }
        })?;
        Ok(())
    }

    pub(crate) async fn delete_in(conn: &mut SqliteConnection, id: DirectoryId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM directories WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Store, "Failed to delete directory", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}

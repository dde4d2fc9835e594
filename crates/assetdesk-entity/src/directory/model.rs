//! Directory entity model.

use assetdesk_core::types::DirectoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A directory in the asset hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DirectoryRecord {
    /// Unique directory identifier.
    pub id: DirectoryId,
    /// Directory name (a single path segment).
    pub name: String,
    /// Parent directory ID (null for root directories).
    pub parent_id: Option<DirectoryId>,
    /// Full materialized path (e.g., `/Photos/2024`).
    pub full_path: String,
    /// When the directory was created.
    pub created_at: DateTime<Utc>,
    /// When the directory was last renamed or moved.
    pub updated_at: DateTime<Utc>,
}

impl DirectoryRecord {
    /// Check if this is a root directory (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Number of path segments above this directory (0 for roots).
    pub fn depth(&self) -> usize {
        self.full_path.matches('/').count().saturating_sub(1)
    }

    /// Build the full path of a directory named `name` under `parent_path`.
    pub fn join_path(parent_path: Option<&str>, name: &str) -> String {
        match parent_path {
            Some(parent) => format!("{parent}/{name}"),
            None => format!("/{name}"),
        }
    }
}

/// Data required to create a new directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectory {
    /// Directory name.
    pub name: String,
    /// Parent directory (None for root).
    pub parent_id: Option<DirectoryId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(DirectoryRecord::join_path(None, "Photos"), "/Photos");
        assert_eq!(
            DirectoryRecord::join_path(Some("/Photos"), "2024"),
            "/Photos/2024"
        );
    }

    #[test]
    fn test_depth() {
        let now = Utc::now();
        let record = DirectoryRecord {
            id: DirectoryId::new(),
            name: "2024".into(),
            parent_id: Some(DirectoryId::new()),
            full_path: "/Photos/2024".into(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(record.depth(), 1);
        assert!(!record.is_root());
    }
}

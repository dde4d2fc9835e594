//! Directory tree structures for hierarchical display.

use assetdesk_core::types::DirectoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::DirectoryRecord;

/// A node in a directory tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryTreeNode {
    /// Directory ID.
    pub id: DirectoryId,
    /// Directory name.
    pub name: String,
    /// Parent directory ID.
    pub parent_id: Option<DirectoryId>,
    /// Full path.
    pub full_path: String,
    /// Depth level (0 for roots).
    pub depth: usize,
    /// When the directory was created.
    pub created_at: DateTime<Utc>,
    /// When the directory was last renamed or moved.
    pub updated_at: DateTime<Utc>,
    /// Number of child directories.
    pub child_count: u64,
    /// Number of files directly in this directory.
    pub file_count: u64,
    /// Child directory nodes, ordered by name.
    pub children: Vec<DirectoryTreeNode>,
}

impl DirectoryTreeNode {
    /// Create a leaf node from a record.
    pub fn leaf(record: &DirectoryRecord, file_count: u64) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            parent_id: record.parent_id,
            full_path: record.full_path.clone(),
            depth: record.depth(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            child_count: 0,
            file_count,
            children: Vec::new(),
        }
    }

    /// Find a node by ID anywhere in this subtree.
    pub fn find(&self, id: DirectoryId) -> Option<&DirectoryTreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }
}

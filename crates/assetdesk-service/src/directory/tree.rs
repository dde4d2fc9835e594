//! In-memory directory forest built from store records.

use std::collections::{HashMap, HashSet};

use assetdesk_core::error::AppError;
use assetdesk_core::result::AppResult;
use assetdesk_core::types::text::fold_case;
use assetdesk_core::types::DirectoryId;
use assetdesk_entity::directory::{DirectoryRecord, DirectoryTreeNode};

/// Canonical tree of directory records plus per-directory file counts.
///
/// Building the cache verifies the forest: every parent exists, no node is
/// its own ancestor, and each path is its parent's path plus its name.
#[derive(Debug, Clone, Default)]
pub struct TreeCache {
    records: HashMap<DirectoryId, DirectoryRecord>,
    children: HashMap<Option<DirectoryId>, Vec<DirectoryId>>,
    file_counts: HashMap<DirectoryId, u64>,
}

impl TreeCache {
    /// Build and verify a cache from flat records.
    pub fn build(
        records: Vec<DirectoryRecord>,
        file_counts: HashMap<DirectoryId, u64>,
    ) -> AppResult<Self> {
        let records: HashMap<DirectoryId, DirectoryRecord> =
            records.into_iter().map(|r| (r.id, r)).collect();

        let mut children: HashMap<Option<DirectoryId>, Vec<DirectoryId>> = HashMap::new();
        for record in records.values() {
            let expected_path = match record.parent_id {
                Some(parent_id) => {
                    let parent = records.get(&parent_id).ok_or_else(|| {
                        AppError::store(format!(
                            "directory {} ({}) references missing parent {parent_id}",
                            record.id, record.full_path
                        ))
                    })?;
                    DirectoryRecord::join_path(Some(&parent.full_path), &record.name)
                }
                None => DirectoryRecord::join_path(None, &record.name),
            };
            if expected_path != record.full_path {
                return Err(AppError::store(format!(
                    "directory {} has path '{}' but its position implies '{expected_path}'",
                    record.id, record.full_path
                )));
            }
            children.entry(record.parent_id).or_default().push(record.id);
        }

        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| {
                let (ra, rb) = (&records[a], &records[b]);
                fold_case(&ra.name)
                    .cmp(&fold_case(&rb.name))
                    .then_with(|| ra.id.cmp(&rb.id))
            });
        }

        let cache = Self {
            records,
            children,
            file_counts,
        };
        cache.verify_acyclic()?;
        Ok(cache)
    }

    fn verify_acyclic(&self) -> AppResult<()> {
        let mut reachable = HashSet::new();
        let mut stack: Vec<DirectoryId> = self.child_ids(None).to_vec();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                return Err(AppError::store(format!("directory {id} has more than one parent")));
            }
            stack.extend_from_slice(self.child_ids(Some(id)));
        }
        if reachable.len() != self.records.len() {
            return Err(AppError::store(format!(
                "{} directories are part of a cycle",
                self.records.len() - reachable.len()
            )));
        }
        Ok(())
    }

    fn child_ids(&self, parent: Option<DirectoryId>) -> &[DirectoryId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of directories.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the forest has no directories.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `id` is a known directory.
    pub fn contains(&self, id: DirectoryId) -> bool {
        self.records.contains_key(&id)
    }

    /// Look up a directory.
    pub fn get(&self, id: DirectoryId) -> Option<&DirectoryRecord> {
        self.records.get(&id)
    }

    /// Direct children of `parent` (roots for `None`), ordered by name.
    pub fn children(&self, parent: Option<DirectoryId>) -> Vec<&DirectoryRecord> {
        self.child_ids(parent)
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Number of child directories.
    pub fn child_count(&self, id: DirectoryId) -> u64 {
        self.child_ids(Some(id)).len() as u64
    }

    /// Number of files directly in `id`.
    pub fn file_count(&self, id: DirectoryId) -> u64 {
        self.file_counts.get(&id).copied().unwrap_or(0)
    }

    /// Ancestors of `id` from the root down, excluding `id` itself.
    pub fn ancestors(&self, id: DirectoryId) -> Vec<&DirectoryRecord> {
        let mut chain = Vec::new();
        let mut cursor = self.records.get(&id).and_then(|r| r.parent_id);
        while let Some(parent_id) = cursor {
            let Some(parent) = self.records.get(&parent_id) else {
                break;
            };
            chain.push(parent);
            cursor = parent.parent_id;
        }
        chain.reverse();
        chain
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: DirectoryId, id: DirectoryId) -> bool {
        ancestor == id || self.ancestors(id).iter().any(|r| r.id == ancestor)
    }

    /// Find a child of `parent` with exactly this name.
    pub fn sibling_named(
        &self,
        parent: Option<DirectoryId>,
        name: &str,
    ) -> Option<&DirectoryRecord> {
        self.children(parent).into_iter().find(|r| r.name == name)
    }

    /// Snapshot of the whole forest as nested nodes.
    pub fn snapshot(&self) -> Vec<DirectoryTreeNode> {
        self.child_ids(None)
            .iter()
            .filter_map(|id| self.node(*id))
            .collect()
    }

    /// Snapshot of the subtree rooted at `id`.
    pub fn node(&self, id: DirectoryId) -> Option<DirectoryTreeNode> {
        let record = self.records.get(&id)?;
        let children: Vec<DirectoryTreeNode> = self
            .child_ids(Some(id))
            .iter()
            .filter_map(|child| self.node(*child))
            .collect();

        let mut node = DirectoryTreeNode::leaf(record, self.file_count(id));
        node.child_count = children.len() as u64;
        node.children = children;
        Some(node)
    }
}

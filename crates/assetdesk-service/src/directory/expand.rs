//! Expand/collapse state of tree nodes.

use std::collections::HashSet;

use assetdesk_core::types::DirectoryId;

/// Which directories are expanded in the tree view. Unknown ids are collapsed.
#[derive(Debug, Clone, Default)]
pub struct ExpandState {
    expanded: HashSet<DirectoryId>,
}

impl ExpandState {
    /// Whether `id` is expanded.
    pub fn is_expanded(&self, id: DirectoryId) -> bool {
        self.expanded.contains(&id)
    }

    /// Set the expansion of `id`.
    pub fn set(&mut self, id: DirectoryId, expanded: bool) {
        if expanded {
            self.expanded.insert(id);
        } else {
            self.expanded.remove(&id);
        }
    }

    /// Flip the expansion of `id` and return the new value.
    pub fn toggle(&mut self, id: DirectoryId) -> bool {
        let next = !self.is_expanded(id);
        self.set(id, next);
        next
    }

    /// Collapse everything.
    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    /// Forget ids that no longer exist.
    pub fn retain(&mut self, live: impl Fn(&DirectoryId) -> bool) {
        self.expanded.retain(|id| live(id));
    }

    /// Expanded ids, unordered.
    pub fn expanded_ids(&self) -> Vec<DirectoryId> {
        self.expanded.iter().copied().collect()
    }
}

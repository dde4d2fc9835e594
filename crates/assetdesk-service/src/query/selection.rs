//! Immutable selection state over a listing.
//!
//! Every operation returns a new [`SelectionState`]; ids absent from the
//! listing passed in are ignored.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use assetdesk_core::types::{DirectoryId, FileId};

use super::entry::{EntryId, Listable};

/// Selected files and directories, plus the anchor for range selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    files: BTreeSet<FileId>,
    directories: BTreeSet<DirectoryId>,
    last_selected: Option<EntryId>,
}

fn listed<T: Listable>(listing: &[T]) -> BTreeSet<EntryId> {
    listing.iter().map(Listable::entry_id).collect()
}

impl SelectionState {
    /// Nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, ids: impl IntoIterator<Item = EntryId>) -> Self {
        for id in ids {
            match id {
                EntryId::File(file) => {
                    self.files.insert(file);
                }
                EntryId::Directory(dir) => {
                    self.directories.insert(dir);
                }
            }
            self.last_selected = Some(id);
        }
        self
    }

    fn without(mut self, id: EntryId) -> Self {
        match id {
            EntryId::File(file) => {
                self.files.remove(&file);
            }
            EntryId::Directory(dir) => {
                self.directories.remove(&dir);
            }
        }
        self
    }

    /// Whether `id` is selected.
    pub fn contains(&self, id: EntryId) -> bool {
        match id {
            EntryId::File(file) => self.files.contains(&file),
            EntryId::Directory(dir) => self.directories.contains(&dir),
        }
    }

    /// Selected file ids, ascending.
    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.iter().copied()
    }

    /// Selected directory ids, ascending.
    pub fn directories(&self) -> impl Iterator<Item = DirectoryId> + '_ {
        self.directories.iter().copied()
    }

    /// Most recently selected entry.
    pub fn last_selected(&self) -> Option<EntryId> {
        self.last_selected
    }

    /// Number of selected entries.
    pub fn len(&self) -> usize {
        self.files.len() + self.directories.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select `ids`, replacing the current selection unless `append` is set.
    pub fn select<T: Listable>(&self, ids: &[EntryId], append: bool, listing: &[T]) -> Self {
        let known = listed(listing);
        let base = if append { self.clone() } else { Self::default() };
        base.with(ids.iter().copied().filter(|id| known.contains(id)))
    }

    /// Empty both sets.
    pub fn clear(&self) -> Self {
        Self::default()
    }

    /// Flip one entry.
    pub fn toggle<T: Listable>(&self, id: EntryId, listing: &[T]) -> Self {
        if self.contains(id) {
            let mut next = self.clone().without(id);
            if next.last_selected == Some(id) {
                next.last_selected = None;
            }
            return next;
        }
        if !listed(listing).contains(&id) {
            return self.clone();
        }
        self.clone().with([id])
    }

    /// Select every entry in the listing.
    pub fn select_all<T: Listable>(&self, listing: &[T]) -> Self {
        Self::default().with(listing.iter().map(Listable::entry_id))
    }

    /// Add every entry between the anchor and `to`, inclusive, in listing order.
    ///
    /// Without an anchor in the listing only `to` is selected.
    pub fn select_range<T: Listable>(&self, to: EntryId, listing: &[T]) -> Self {
        let position = |id: EntryId| listing.iter().position(|item| item.entry_id() == id);
        let Some(end) = position(to) else {
            return self.clone();
        };
        let start = self.last_selected.and_then(position).unwrap_or(end);
        let (low, high) = if start <= end { (start, end) } else { (end, start) };

        let mut next = self.clone().with(listing[low..=high].iter().map(Listable::entry_id));
        next.last_selected = Some(to);
        next
    }

    /// Drop selected ids that are not in a refreshed listing.
    pub fn reconcile<T: Listable>(&self, listing: &[T]) -> Self {
        let known = listed(listing);
        let mut next = self.clone();
        next.files.retain(|id| known.contains(&EntryId::File(*id)));
        next.directories
            .retain(|id| known.contains(&EntryId::Directory(*id)));
        if next.last_selected.is_some_and(|id| !known.contains(&id)) {
            next.last_selected = None;
        }
        next
    }
}

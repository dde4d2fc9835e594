//! Directory index service.
//!
//! Validates structural operations against the cached tree before they reach
//! the metadata store, and rebuilds the cache after every mutation.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::{debug, info};

use assetdesk_core::error::{AppError, ErrorKind};
use assetdesk_core::result::AppResult;
use assetdesk_core::types::DirectoryId;
use assetdesk_database::MetadataStore;
use assetdesk_entity::directory::{CreateDirectory, DirectoryRecord, DirectoryTreeNode};

use super::expand::ExpandState;
use super::name::validate_directory_name;
use super::tree::TreeCache;

/// Canonical in-memory view of the directory hierarchy.
#[derive(Debug, Clone)]
pub struct DirectoryIndex {
    store: MetadataStore,
    cache: Arc<RwLock<TreeCache>>,
    expand: Arc<RwLock<ExpandState>>,
    /// Held from the store read until the rebuilt cache is installed.
    rebuild: Arc<Mutex<()>>,
}

impl DirectoryIndex {
    /// Load the index from the store.
    pub async fn load(store: MetadataStore) -> AppResult<Self> {
        let index = Self {
            store,
            cache: Arc::new(RwLock::new(TreeCache::default())),
            expand: Arc::new(RwLock::new(ExpandState::default())),
            rebuild: Arc::new(Mutex::new(())),
        };
        index.refresh().await?;
        Ok(index)
    }

    /// The underlying metadata store.
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    fn cache(&self) -> RwLockReadGuard<'_, TreeCache> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn expand_mut(&self) -> RwLockWriteGuard<'_, ExpandState> {
        self.expand.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rebuild the cache from the store and prune expansion of deleted ids.
    ///
    /// Rebuilds run one at a time, so a snapshot read earlier can never
    /// replace one read later.
    pub async fn refresh(&self) -> AppResult<()> {
        let _rebuild = self.rebuild.lock().await;
        let records = self.store.list_tree().await?;
        let counts = self.store.file_counts().await?;
        let rebuilt = TreeCache::build(records, counts)?;
        let len = rebuilt.len();

        self.expand_mut().retain(|id| rebuilt.contains(*id));
        *self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = rebuilt;

        debug!(directories = len, "Directory index rebuilt");
        Ok(())
    }

    /// Return the directory, reloading once if the cache does not know it.
    pub async fn ensure_exists(&self, id: DirectoryId) -> AppResult<DirectoryRecord> {
        if let Some(record) = self.get(id) {
            return Ok(record);
        }
        self.refresh().await?;
        self.get(id)
            .ok_or_else(|| AppError::not_found(format!("directory {id} not found")))
    }

    fn ensure_no_sibling(
        &self,
        operation: &str,
        parent_id: Option<DirectoryId>,
        name: &str,
        except: Option<DirectoryId>,
    ) -> AppResult<()> {
        let cache = self.cache();
        if let Some(existing) = cache.sibling_named(parent_id, name) {
            if Some(existing.id) != except {
                return Err(AppError::name_conflict(format!(
                    "{operation}: directory '{}' already exists",
                    existing.full_path
                )));
            }
        }
        Ok(())
    }

    // -- Mutations ---------------------------------------------------------

    /// Create a directory under `parent_id`, or at the root level.
    pub async fn create_directory(
        &self,
        name: &str,
        parent_id: Option<DirectoryId>,
    ) -> AppResult<DirectoryRecord> {
        let name = validate_directory_name(name)?;
        if let Some(parent_id) = parent_id {
            self.ensure_exists(parent_id).await.map_err(|e| {
                if e.is(ErrorKind::NotFound) {
                    AppError::not_found(format!(
                        "create_directory '{name}': parent directory {parent_id} not found"
                    ))
                } else {
                    e
                }
            })?;
        }
        self.ensure_no_sibling("create_directory", parent_id, &name, None)?;

        let record = self
            .store
            .create_directory(&CreateDirectory { name, parent_id })
            .await?;
        self.refresh().await?;
        Ok(record)
    }

    /// Rename a directory in place.
    pub async fn rename_directory(
        &self,
        id: DirectoryId,
        new_name: &str,
    ) -> AppResult<DirectoryRecord> {
        let new_name = validate_directory_name(new_name)?;
        let record = self.ensure_exists(id).await?;
        self.ensure_no_sibling("rename_directory", record.parent_id, &new_name, Some(id))?;

        let updated = self.store.rename_directory(id, &new_name).await?;
        self.refresh().await?;
        Ok(updated)
    }

    /// Move a directory under `new_parent_id`, or to the root level.
    pub async fn move_directory(
        &self,
        id: DirectoryId,
        new_parent_id: Option<DirectoryId>,
    ) -> AppResult<DirectoryRecord> {
        let record = self.ensure_exists(id).await?;
        if let Some(target) = new_parent_id {
            self.ensure_exists(target).await?;
            if self.cache().is_ancestor_or_self(id, target) {
                return Err(AppError::validation(format!(
                    "move_directory {}: cannot move a directory into itself or a descendant",
                    record.full_path
                )));
            }
        }
        if record.parent_id == new_parent_id {
            return Ok(record);
        }
        self.ensure_no_sibling("move_directory", new_parent_id, &record.name, Some(id))?;

        let updated = self.store.move_directory(id, new_parent_id).await?;
        self.refresh().await?;
        Ok(updated)
    }

    /// Delete an empty directory.
    pub async fn delete_directory(&self, id: DirectoryId) -> AppResult<()> {
        let record = self.ensure_exists(id).await?;
        {
            let cache = self.cache();
            let children = cache.child_count(id);
            let files = cache.file_count(id);
            if children > 0 || files > 0 {
                return Err(AppError::not_empty(format!(
                    "delete_directory {}: contains {children} subdirector{} and {files} file{}",
                    record.full_path,
                    if children == 1 { "y" } else { "ies" },
                    if files == 1 { "" } else { "s" },
                )));
            }
        }

        self.store.delete_directory(id).await?;
        self.refresh().await
    }

    /// Delete a directory and everything beneath it.
    ///
    /// Returns the content paths of the removed file records; the caller owns
    /// blob deletion.
    pub async fn delete_directory_recursive(&self, id: DirectoryId) -> AppResult<Vec<String>> {
        self.ensure_exists(id).await?;
        let content_paths = self.store.delete_directory_recursive(id).await?;
        self.refresh().await?;
        Ok(content_paths)
    }

    // -- Queries -----------------------------------------------------------

    /// Look up a directory.
    pub fn get(&self, id: DirectoryId) -> Option<DirectoryRecord> {
        self.cache().get(id).cloned()
    }

    /// Direct children of `parent`, or the roots.
    pub fn children(&self, parent: Option<DirectoryId>) -> Vec<DirectoryRecord> {
        self.cache().children(parent).into_iter().cloned().collect()
    }

    /// Full path of a directory.
    pub fn path(&self, id: DirectoryId) -> Option<String> {
        self.cache().get(id).map(|r| r.full_path.clone())
    }

    /// Ancestors of `id`, root first.
    pub fn ancestors(&self, id: DirectoryId) -> Vec<DirectoryRecord> {
        self.cache().ancestors(id).into_iter().cloned().collect()
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: DirectoryId, id: DirectoryId) -> bool {
        ancestor != id && self.cache().is_ancestor_or_self(ancestor, id)
    }

    /// Nested snapshot of the whole forest.
    pub fn tree(&self) -> Vec<DirectoryTreeNode> {
        self.cache().snapshot()
    }

    /// Number of directories.
    pub fn len(&self) -> usize {
        self.cache().len()
    }

    /// Whether there are no directories.
    pub fn is_empty(&self) -> bool {
        self.cache().is_empty()
    }

    // -- Expansion ---------------------------------------------------------

    /// Flip the expansion of a directory.
    pub fn toggle(&self, id: DirectoryId) -> bool {
        self.expand_mut().toggle(id)
    }

    /// Set the expansion of a directory.
    pub fn set_expanded(&self, id: DirectoryId, expanded: bool) {
        self.expand_mut().set(id, expanded);
    }

    /// Whether a directory is expanded.
    pub fn is_expanded(&self, id: DirectoryId) -> bool {
        self.expand
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_expanded(id)
    }

    /// Expand every ancestor of `id` so it becomes visible.
    pub fn expand_to(&self, id: DirectoryId) {
        let ancestors = self.ancestors(id);
        let mut expand = self.expand_mut();
        for ancestor in ancestors {
            expand.set(ancestor.id, true);
        }
    }

    /// Collapse every directory.
    pub fn collapse_all(&self) {
        self.expand_mut().clear();
        info!("Directory tree collapsed");
    }
}

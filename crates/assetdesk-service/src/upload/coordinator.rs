//! Upload coordinator: a FIFO queue drained by at most K concurrent transfers.
//!
//! Each admitted item holds an owned semaphore permit for as long as its
//! transfer task runs, including cleanup after a cancel. Queue snapshots
//! are published on a `watch` channel after every change.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{watch, Notify, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use assetdesk_core::config::upload::UploadConfig;
use assetdesk_core::error::{AppError, ErrorKind};
use assetdesk_core::result::AppResult;
use assetdesk_core::types::{DirectoryId, UploadId};
use assetdesk_entity::file::FileRecord;
use assetdesk_entity::upload::{UploadItem, UploadStatus};

use super::policy::UploadPolicy;
use super::source::UploadSource;
use crate::directory::DirectoryIndex;
use crate::file::ContentIngest;

struct Slot {
    item: UploadItem,
    source: Option<UploadSource>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct QueueState {
    slots: Vec<Slot>,
    running: HashSet<UploadId>,
}

impl QueueState {
    fn slot_mut(&mut self, id: UploadId) -> AppResult<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|s| s.item.id == id)
            .ok_or_else(|| AppError::not_found(format!("upload {id} not found")))
    }

    fn items(&self) -> Vec<UploadItem> {
        self.slots.iter().map(|s| s.item.clone()).collect()
    }

    fn is_idle(&self) -> bool {
        self.running.is_empty() && !self.slots.iter().any(|s| s.item.status.is_active())
    }
}

struct Inner {
    state: Mutex<QueueState>,
    permits: Arc<Semaphore>,
    ingest: ContentIngest,
    index: DirectoryIndex,
    policy: UploadPolicy,
    chunk_size: usize,
    max_batch_size: usize,
    updates: watch::Sender<Vec<UploadItem>>,
    idle: Notify,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &QueueState) {
        self.updates.send_replace(state.items());
        if state.is_idle() {
            self.idle.notify_waiters();
        }
    }

    /// Admit Pending items in queue order while permits remain.
    fn pump(self: &Arc<Self>) {
        let mut state = self.lock();
        loop {
            let Some(position) = state
                .slots
                .iter()
                .position(|s| s.item.status == UploadStatus::Pending)
            else {
                break;
            };
            let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
                debug!("All upload slots occupied");
                break;
            };

            let slot = &mut state.slots[position];
            if let Err(e) = slot.item.start() {
                error!(upload_id = %slot.item.id, error = %e, "Failed to start upload");
                break;
            }
            let source = match slot.source.as_ref().and_then(UploadSource::replay) {
                Some(copy) => Some(copy),
                None => slot.source.take(),
            };
            let Some(source) = source else {
                let _ = slot.item.fail("source can no longer be read");
                continue;
            };

            let id = slot.item.id;
            let directory_id = slot.item.target_directory_id;
            slot.cancel = CancellationToken::new();
            let cancel = slot.cancel.clone();
            state.running.insert(id);
            debug!(upload_id = %id, name = %source.name(), "Upload admitted");

            let inner = Arc::clone(self);
            tokio::spawn(async move {
                inner.transfer(permit, id, directory_id, source, cancel).await;
            });
        }
        self.publish(&state);
    }

    async fn transfer(
        self: Arc<Self>,
        permit: OwnedSemaphorePermit,
        id: UploadId,
        directory_id: DirectoryId,
        source: UploadSource,
        cancel: CancellationToken,
    ) {
        let name = source.name().to_string();
        let outcome = match source.open(self.chunk_size).await {
            Ok(stream) => {
                let progress = |written: u64| self.record_progress(id, written);
                self.ingest
                    .ingest(&name, directory_id, stream, &progress, &cancel)
                    .await
            }
            Err(e) => Err(e),
        };

        self.finish(id, outcome).await;
        drop(permit);
        self.pump();
    }

    fn record_progress(&self, id: UploadId, written: u64) {
        let mut state = self.lock();
        let changed = state
            .slots
            .iter_mut()
            .find(|s| s.item.id == id)
            .is_some_and(|s| s.item.record_progress(written));
        if changed {
            self.updates.send_replace(state.items());
        }
    }

    /// Settle the item's status, undo a record that raced a cancel, and
    /// only then release the item from the running set.
    async fn finish(&self, id: UploadId, outcome: AppResult<FileRecord>) {
        let (undo, completed) = {
            let mut state = self.lock();
            let slot = state.slots.iter_mut().find(|s| s.item.id == id);

            let settled = match (slot, outcome) {
                (Some(slot), Ok(record)) if slot.item.status == UploadStatus::Uploading => {
                    info!(upload_id = %id, file_id = %record.id, name = %record.name, "Upload completed");
                    (None, slot.item.complete(record).is_ok())
                }
                // Cancelled or removed while the record was being written.
                (_, Ok(record)) => (Some(record), false),
                (Some(slot), Err(e)) if slot.item.status == UploadStatus::Uploading => {
                    if e.is(ErrorKind::Cancelled) {
                        let _ = slot.item.cancel();
                        info!(upload_id = %id, "Upload cancelled");
                    } else {
                        warn!(upload_id = %id, name = %slot.item.name, error = %e, "Upload failed");
                        let _ = slot.item.fail(e.message);
                    }
                    (None, false)
                }
                (_, Err(e)) => {
                    debug!(upload_id = %id, error = %e, "Cancelled upload stopped");
                    (None, false)
                }
            };
            self.publish(&state);
            settled
        };

        if let Some(record) = undo {
            self.roll_back(id, &record).await;
        }
        if completed {
            if let Err(e) = self.index.refresh().await {
                warn!(error = %e, "Failed to refresh directory index after upload");
            }
        }

        let mut state = self.lock();
        state.running.remove(&id);
        self.publish(&state);
    }

    /// Remove a record that landed after its upload was cancelled.
    async fn roll_back(&self, id: UploadId, record: &FileRecord) {
        if let Err(e) = self.ingest.undo(record).await {
            error!(upload_id = %id, file_id = %record.id, error = %e, "Failed to roll back cancelled upload");
            return;
        }
        if let Err(e) = self.index.refresh().await {
            warn!(error = %e, "Failed to refresh directory index after rollback");
        }
    }
}

/// Runs uploads under a concurrency cap and tracks their status.
#[derive(Clone)]
pub struct UploadCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for UploadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCoordinator")
            .field("available_permits", &self.inner.permits.available_permits())
            .finish()
    }
}

impl UploadCoordinator {
    /// Creates a coordinator with `max_concurrent_uploads` transfer slots.
    pub fn new(ingest: ContentIngest, index: DirectoryIndex, config: &UploadConfig) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                permits: Arc::new(Semaphore::new(config.max_concurrent_uploads.max(1))),
                ingest,
                index,
                policy: UploadPolicy::from_config(config),
                chunk_size: config.chunk_size_bytes,
                max_batch_size: config.max_batch_size,
                updates,
                idle: Notify::new(),
            }),
        }
    }

    /// The admission policy.
    pub fn policy(&self) -> &UploadPolicy {
        &self.inner.policy
    }

    /// Queue sources for upload into `directory_id`.
    ///
    /// Candidates failing the policy are queued directly in Error with the
    /// reason and never take a slot.
    pub async fn enqueue(
        &self,
        sources: Vec<UploadSource>,
        directory_id: DirectoryId,
    ) -> AppResult<Vec<UploadId>> {
        if sources.len() > self.inner.max_batch_size {
            return Err(AppError::validation(format!(
                "enqueue: {} files exceeds the batch limit of {}",
                sources.len(),
                self.inner.max_batch_size
            )));
        }
        let directory = self.inner.index.ensure_exists(directory_id).await?;

        let mut ids = Vec::with_capacity(sources.len());
        let mut rejected = 0usize;
        {
            let mut state = self.inner.lock();
            for source in sources {
                let item = match self.inner.policy.check(source.name(), source.size()) {
                    Ok(()) => UploadItem::pending(source.name(), source.size(), directory_id),
                    Err(e) => {
                        rejected += 1;
                        debug!(name = %source.name(), reason = %e, "Upload rejected");
                        UploadItem::rejected(source.name(), source.size(), directory_id, e.message)
                    }
                };
                ids.push(item.id);
                state.slots.push(Slot {
                    item,
                    source: Some(source),
                    cancel: CancellationToken::new(),
                });
            }
        }

        info!(
            directory = %directory.full_path,
            queued = ids.len() - rejected,
            rejected,
            "Uploads enqueued"
        );
        self.inner.pump();
        Ok(ids)
    }

    /// Cancel an Uploading item. The transfer stops at its next checkpoint.
    pub fn cancel(&self, id: UploadId) -> AppResult<()> {
        let mut state = self.inner.lock();
        let slot = state.slot_mut(id)?;
        slot.item.cancel()?;
        slot.cancel.cancel();
        info!(upload_id = %id, name = %slot.item.name, "Upload cancel requested");
        self.inner.publish(&state);
        Ok(())
    }

    /// Cancel every Uploading item and drop every Pending one.
    pub fn cancel_all(&self) -> usize {
        let mut state = self.inner.lock();
        let mut affected = 0;
        state.slots.retain_mut(|slot| match slot.item.status {
            UploadStatus::Pending => {
                affected += 1;
                false
            }
            UploadStatus::Uploading => {
                if slot.item.cancel().is_ok() {
                    slot.cancel.cancel();
                    affected += 1;
                }
                true
            }
            _ => true,
        });
        info!(affected, "All uploads cancelled");
        self.inner.publish(&state);
        affected
    }

    /// Requeue an item in Error after checking it against the policy again.
    pub fn retry(&self, id: UploadId) -> AppResult<()> {
        {
            let mut state = self.inner.lock();
            let slot = state.slot_mut(id)?;
            if slot.item.status != UploadStatus::Error {
                return Err(AppError::invalid_state(format!(
                    "retry {}: upload is {}, not error",
                    slot.item.name, slot.item.status
                )));
            }
            if slot.source.is_none() {
                return Err(AppError::validation(format!(
                    "retry {}: the source was a one-shot stream and has been consumed",
                    slot.item.name
                )));
            }
            if let Err(e) = self.inner.policy.check(&slot.item.name, slot.item.size) {
                slot.item.reject_again(e.message.clone());
                self.inner.publish(&state);
                return Err(e);
            }
            slot.item.retry()?;
            info!(upload_id = %id, name = %slot.item.name, "Upload retried");
        }
        self.inner.pump();
        Ok(())
    }

    /// Remove an item that is not currently uploading.
    pub fn remove(&self, id: UploadId) -> AppResult<UploadItem> {
        let mut state = self.inner.lock();
        let position = state
            .slots
            .iter()
            .position(|s| s.item.id == id)
            .ok_or_else(|| AppError::not_found(format!("upload {id} not found")))?;
        if state.slots[position].item.status == UploadStatus::Uploading {
            return Err(AppError::invalid_state(format!(
                "remove {}: upload is in progress, cancel it first",
                state.slots[position].item.name
            )));
        }
        let slot = state.slots.remove(position);
        self.inner.publish(&state);
        Ok(slot.item)
    }

    /// Remove Completed and Cancelled items.
    pub fn clear_finished(&self) -> usize {
        let mut state = self.inner.lock();
        let before = state.slots.len();
        state.slots.retain(|s| !s.item.status.is_terminal());
        let removed = before - state.slots.len();
        self.inner.publish(&state);
        removed
    }

    /// Current queue in enqueue order.
    pub fn snapshot(&self) -> Vec<UploadItem> {
        self.inner.lock().items()
    }

    /// One item by id.
    pub fn get(&self, id: UploadId) -> Option<UploadItem> {
        self.inner
            .lock()
            .slots
            .iter()
            .find(|s| s.item.id == id)
            .map(|s| s.item.clone())
    }

    /// Snapshots of the queue, sent after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<UploadItem>> {
        self.inner.updates.subscribe()
    }

    /// Number of transfer tasks still running.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().running.len()
    }

    /// Wait until nothing is Pending, Uploading, or still cleaning up.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.lock().is_idle() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetdesk_core::config::database::DatabaseConfig;
    use assetdesk_core::traits::{ByteStream, ContentStore};
    use assetdesk_database::{run_migrations, DatabasePool, MetadataStore};
    use assetdesk_storage::LocalContentStore;
    use bytes::Bytes;
    use futures::{stream, StreamExt};

    struct Fixture {
        _dir: tempfile::TempDir,
        content: Arc<LocalContentStore>,
        index: DirectoryIndex,
        coordinator: UploadCoordinator,
        directory_id: DirectoryId,
    }

    async fn fixture(config: UploadConfig) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = DatabasePool::connect(&dir.path().join("test.db"), &DatabaseConfig::default())
            .await
            .unwrap();
        run_migrations(db.pool()).await.unwrap();
        let store = MetadataStore::new(&db);
        let content = Arc::new(LocalContentStore::new(dir.path().join("content")).await.unwrap());
        let index = DirectoryIndex::load(store.clone()).await.unwrap();
        let inbox = index.create_directory("inbox", None).await.unwrap();
        let ingest = ContentIngest::new(store, content.clone(), config.max_file_size);
        let coordinator = UploadCoordinator::new(ingest, index.clone(), &config);
        Fixture {
            _dir: dir,
            content,
            index,
            coordinator,
            directory_id: inbox.id,
        }
    }

    /// A stream that yields `data` once `gate` hands out a permit.
    fn gated(name: &str, data: &'static [u8], gate: Arc<Semaphore>) -> UploadSource {
        let stream: ByteStream = Box::pin(stream::once(async move {
            gate.acquire().await.map_err(std::io::Error::other)?.forget();
            Ok::<_, std::io::Error>(Bytes::from_static(data))
        }));
        UploadSource::from_stream(name, data.len() as u64, stream)
    }

    /// Like [`gated`], but `head` is yielded before waiting on the gate.
    fn gated_after(
        name: &str,
        head: &'static [u8],
        tail: &'static [u8],
        gate: Arc<Semaphore>,
    ) -> UploadSource {
        let first = stream::iter([Ok::<_, std::io::Error>(Bytes::from_static(head))]);
        let stream: ByteStream = Box::pin(first.chain(stream::once(async move {
            gate.acquire().await.map_err(std::io::Error::other)?.forget();
            Ok::<_, std::io::Error>(Bytes::from_static(tail))
        })));
        UploadSource::from_stream(name, (head.len() + tail.len()) as u64, stream)
    }

    fn count(items: &[UploadItem], status: UploadStatus) -> usize {
        items.iter().filter(|i| i.status == status).count()
    }

    #[tokio::test]
    async fn test_bounded_concurrency() {
        let f = fixture(UploadConfig::default()).await;
        let gate = Arc::new(Semaphore::new(0));
        let sources = (0..5)
            .map(|i| gated(&format!("f{i}.txt"), b"payload", gate.clone()))
            .collect();

        f.coordinator.enqueue(sources, f.directory_id).await.unwrap();
        let items = f.coordinator.snapshot();
        assert_eq!(count(&items, UploadStatus::Uploading), 3);
        assert_eq!(count(&items, UploadStatus::Pending), 2);
        // FIFO: the first three were admitted.
        assert!(items[..3].iter().all(|i| i.status == UploadStatus::Uploading));

        let mut rx = f.coordinator.subscribe();
        gate.add_permits(1);
        rx.wait_for(|items| count(items, UploadStatus::Completed) == 1)
            .await
            .unwrap();
        let items = f.coordinator.snapshot();
        assert!(count(&items, UploadStatus::Uploading) <= 3);

        gate.add_permits(4);
        f.coordinator.wait_idle().await;
        let items = f.coordinator.snapshot();
        assert_eq!(count(&items, UploadStatus::Completed), 5);
        assert!(items.iter().all(|i| i.progress == 100));
        assert_eq!(f.index.tree()[0].file_count, 5);
    }

    #[tokio::test]
    async fn test_roll_back_corrects_cached_counts() {
        let f = fixture(UploadConfig::default()).await;
        let record = f
            .coordinator
            .inner
            .ingest
            .ingest_bytes("late.txt", f.directory_id, Bytes::from_static(b"late"))
            .await
            .unwrap();
        f.index.refresh().await.unwrap();
        assert_eq!(f.index.tree()[0].file_count, 1);

        f.coordinator.inner.roll_back(UploadId::new(), &record).await;
        assert_eq!(f.index.tree()[0].file_count, 0);
        assert!(f.content.list_blobs().await.unwrap().is_empty());
        f.index.delete_directory(f.directory_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_leaves_no_blob() {
        let f = fixture(UploadConfig::default()).await;
        let gate = Arc::new(Semaphore::new(0));
        let ids = f
            .coordinator
            .enqueue(vec![gated("a.txt", b"abc", gate.clone())], f.directory_id)
            .await
            .unwrap();

        f.coordinator.cancel(ids[0]).unwrap();
        assert_eq!(f.coordinator.get(ids[0]).unwrap().status, UploadStatus::Cancelled);
        f.coordinator.wait_idle().await;

        assert!(f.content.list_blobs().await.unwrap().is_empty());
        assert_eq!(f.content.sweep_temp().await.unwrap(), 0);
        assert_eq!(f.coordinator.in_flight(), 0);
        let err = f.coordinator.cancel(ids[0]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_rejected_items_never_start() {
        let config = UploadConfig {
            max_file_size: 4,
            ..UploadConfig::default()
        };
        let f = fixture(config).await;
        let ids = f
            .coordinator
            .enqueue(
                vec![
                    UploadSource::from_bytes("big.txt", &b"too large"[..]),
                    UploadSource::from_bytes("virus.exe", &b"mz"[..]),
                    UploadSource::from_bytes("ok.txt", &b"ok"[..]),
                ],
                f.directory_id,
            )
            .await
            .unwrap();
        f.coordinator.wait_idle().await;

        let big = f.coordinator.get(ids[0]).unwrap();
        assert_eq!(big.status, UploadStatus::Error);
        assert!(big.error.unwrap().contains("exceeds"));
        assert_eq!(f.coordinator.get(ids[1]).unwrap().status, UploadStatus::Error);
        assert_eq!(f.coordinator.get(ids[2]).unwrap().status, UploadStatus::Completed);

        let err = f.coordinator.retry(ids[0]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SizeExceeded);
        assert_eq!(f.coordinator.get(ids[0]).unwrap().status, UploadStatus::Error);
    }

    #[tokio::test]
    async fn test_metadata_failure_removes_blob() {
        let f = fixture(UploadConfig::default()).await;
        let doomed = f.index.create_directory("doomed", None).await.unwrap();
        let gate = Arc::new(Semaphore::new(0));
        let ids = f
            .coordinator
            .enqueue(vec![gated_after("a.txt", b"abc", b"def", gate.clone())], doomed.id)
            .await
            .unwrap();

        // Once the first chunk is written, remove the target directory.
        let mut rx = f.coordinator.subscribe();
        rx.wait_for(|items| items[0].progress > 0).await.unwrap();
        f.index.delete_directory(doomed.id).await.unwrap();
        gate.add_permits(1);
        f.coordinator.wait_idle().await;

        let item = f.coordinator.get(ids[0]).unwrap();
        assert_eq!(item.status, UploadStatus::Error);
        assert!(f.content.list_blobs().await.unwrap().is_empty());

        // The stream was consumed, so the item cannot be retried.
        let err = f.coordinator.retry(ids[0]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_remove_and_clear_finished() {
        let f = fixture(UploadConfig::default()).await;
        let gate = Arc::new(Semaphore::new(0));
        let ids = f
            .coordinator
            .enqueue(
                vec![
                    UploadSource::from_bytes("done.txt", &b"done"[..]),
                    gated("slow.txt", b"slow", gate.clone()),
                ],
                f.directory_id,
            )
            .await
            .unwrap();

        let err = f.coordinator.remove(ids[1]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);

        gate.add_permits(1);
        f.coordinator.wait_idle().await;
        assert_eq!(f.coordinator.clear_finished(), 2);
        assert!(f.coordinator.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_all_drops_pending() {
        let config = UploadConfig {
            max_concurrent_uploads: 1,
            ..UploadConfig::default()
        };
        let f = fixture(config).await;
        let gate = Arc::new(Semaphore::new(0));
        let sources = (0..3)
            .map(|i| gated(&format!("f{i}.txt"), b"data", gate.clone()))
            .collect();
        f.coordinator.enqueue(sources, f.directory_id).await.unwrap();

        assert_eq!(f.coordinator.cancel_all(), 3);
        f.coordinator.wait_idle().await;
        let items = f.coordinator.snapshot();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, UploadStatus::Cancelled);
        assert!(f.content.list_blobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_limit() {
        let config = UploadConfig {
            max_batch_size: 1,
            ..UploadConfig::default()
        };
        let f = fixture(config).await;
        let sources = vec![
            UploadSource::from_bytes("a.txt", &b"a"[..]),
            UploadSource::from_bytes("b.txt", &b"b"[..]),
        ];
        let err = f.coordinator.enqueue(sources, f.directory_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(f.coordinator.snapshot().is_empty());
    }
}

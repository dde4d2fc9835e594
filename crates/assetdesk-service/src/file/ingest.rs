//! Moves bytes into the content store and records them.

use std::sync::Arc;

use futures::{stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use assetdesk_core::error::AppError;
use assetdesk_core::mime::{detect_mime, mime_from_name};
use assetdesk_core::result::AppResult;
use assetdesk_core::traits::{ByteStream, ContentStore, ProgressFn, WriteOptions};
use assetdesk_core::types::DirectoryId;
use assetdesk_database::MetadataStore;
use assetdesk_entity::file::{CreateFile, FileRecord};

/// Saves content, then creates its record; deletes the blob if recording fails.
#[derive(Debug, Clone)]
pub struct ContentIngest {
    store: MetadataStore,
    content: Arc<dyn ContentStore>,
    max_file_size: u64,
}

impl ContentIngest {
    /// Creates a new ingest pipeline.
    pub fn new(store: MetadataStore, content: Arc<dyn ContentStore>, max_file_size: u64) -> Self {
        Self {
            store,
            content,
            max_file_size,
        }
    }

    /// The content store blobs are written to.
    pub fn content(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    /// Stream `data` into a new file named `name` inside `directory_id`.
    ///
    /// `progress` receives the cumulative bytes written. When `cancel` fires
    /// the write stops at its next checkpoint and no blob or record remains.
    pub async fn ingest(
        &self,
        name: &str,
        directory_id: DirectoryId,
        data: ByteStream,
        progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> AppResult<FileRecord> {
        if self.store.get_directory(directory_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "upload '{name}': directory {directory_id} not found"
            )));
        }

        let (mime_type, data) = match mime_from_name(name) {
            Some(mime) => (mime, data),
            None => Self::sniff(name, data, cancel).await?,
        };

        let options = WriteOptions::new(name, mime_type.clone()).with_max_bytes(self.max_file_size);
        let saved = self
            .content
            .save_stream(data, &options, progress, cancel)
            .await?;

        if cancel.is_cancelled() {
            self.discard_blob(&saved.content_path).await;
            return Err(AppError::cancelled(format!("upload '{name}' was cancelled")));
        }

        let input = CreateFile {
            name: name.to_string(),
            directory_id,
            content_path: saved.content_path.clone(),
            size: saved.size as i64,
            mime_type,
        };
        match self.store.create_file(&input).await {
            Ok(record) => {
                info!(
                    file_id = %record.id,
                    directory_id = %directory_id,
                    name = %record.name,
                    size = record.size,
                    content_path = %record.content_path,
                    "File ingested"
                );
                Ok(record)
            }
            Err(e) => {
                warn!(
                    name = %name,
                    content_path = %saved.content_path,
                    error = %e,
                    "Recording file failed, removing stored content"
                );
                self.discard_blob(&saved.content_path).await;
                Err(e)
            }
        }
    }

    /// Ingest an in-memory buffer.
    pub async fn ingest_bytes(
        &self,
        name: &str,
        directory_id: DirectoryId,
        data: bytes::Bytes,
    ) -> AppResult<FileRecord> {
        let stream: ByteStream = Box::pin(stream::once(async move { Ok::<_, std::io::Error>(data) }));
        self.ingest(name, directory_id, stream, &|_: u64| {}, &CancellationToken::new())
            .await
    }

    /// Remove a record and its blob after a completion raced a cancel.
    pub async fn undo(&self, record: &FileRecord) -> AppResult<()> {
        let content_path = self.store.delete_file(record.id).await?;
        self.discard_blob(&content_path).await;
        info!(file_id = %record.id, name = %record.name, "Cancelled upload rolled back");
        Ok(())
    }

    /// Detect the MIME type from the first chunk and put the chunk back.
    async fn sniff(
        name: &str,
        mut data: ByteStream,
        cancel: &CancellationToken,
    ) -> AppResult<(String, ByteStream)> {
        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(AppError::cancelled(format!("upload '{name}' was cancelled")));
            }
            next = data.next() => next.transpose()?,
        };
        let mime = detect_mime(name, first.as_deref().unwrap_or_default());
        let replay: ByteStream = Box::pin(stream::iter(first.map(Ok)).chain(data));
        Ok((mime, replay))
    }

    async fn discard_blob(&self, content_path: &str) {
        if let Err(e) = self.content.delete(content_path).await {
            warn!(content_path = %content_path, error = %e, "Failed to delete stored content");
        }
    }
}

//! Local filesystem content store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use assetdesk_core::error::{AppError, ErrorKind};
use assetdesk_core::mime::ContentBucket;
use assetdesk_core::result::AppResult;
use assetdesk_core::traits::content::{
    ByteStream, ContentStore, ProgressFn, SavedContent, WriteOptions,
};

use crate::paths::{self, TEMP_DIR, TEMP_SUFFIX};
use crate::temp::TempFile;

/// Content store rooted at a local directory.
///
/// Layout: `<root>/{images,documents,others}/<uuid>.<ext>` for blobs and
/// `<root>/.tmp/<uuid>.part` for writes in progress.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalContentStore {
    /// Create a store rooted at `root`, creating the bucket layout.
    pub async fn new(root: impl AsRef<Path>) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        let dirs = ContentBucket::ALL
            .iter()
            .map(|b| root.join(b.dir_name()))
            .chain(std::iter::once(root.join(TEMP_DIR)));
        for dir in dirs {
            fs::create_dir_all(&dir).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Content,
                    format!("Failed to create content directory: {}", dir.display()),
                    e,
                )
            })?;
        }
        info!(root = %root.display(), "Content store ready");
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a content path to a filesystem path within the root.
    fn resolve(&self, content_path: &str) -> AppResult<PathBuf> {
        let (bucket, name) = paths::parse_content_path(content_path)?;
        Ok(self.root.join(bucket.dir_name()).join(name))
    }

    fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }
}

fn map_missing(err: std::io::Error, operation: &str, content_path: &str) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("{operation}: blob '{content_path}' not found"))
    } else {
        AppError::with_source(
            ErrorKind::Content,
            format!("{operation}: failed on blob '{content_path}'"),
            err,
        )
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.is_dir() && self.temp_dir().is_dir())
    }

    async fn save(&self, data: Bytes, original_name: &str, mime_type: &str) -> AppResult<String> {
        let options = WriteOptions::new(original_name, mime_type);
        let stream: ByteStream = Box::pin(stream::once(async move { Ok::<_, std::io::Error>(data) }));
        let saved = self
            .save_stream(stream, &options, &|_: u64| {}, &CancellationToken::new())
            .await?;
        Ok(saved.content_path)
    }

    async fn save_stream(
        &self,
        mut stream: ByteStream,
        options: &WriteOptions,
        progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> AppResult<SavedContent> {
        let blob_name = paths::generate_blob_name(&options.original_name);
        let content_path = paths::content_path(options.bucket(), &blob_name);
        let final_path = self.resolve(&content_path)?;

        let temp = TempFile::new(self.temp_dir().join(format!("{}{TEMP_SUFFIX}", Uuid::new_v4())));
        let mut file = fs::File::create(temp.path()).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Content,
                format!("save '{}': failed to create temporary file", options.original_name),
                e,
            )
        })?;

        let cancelled = || {
            AppError::cancelled(format!("save '{}': cancelled", options.original_name))
        };

        let mut written: u64 = 0;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Content,
                    format!("save '{}': failed to read source", options.original_name),
                    e,
                )
            })?;

            written += chunk.len() as u64;
            if let Some(max) = options.max_bytes.filter(|max| written > *max) {
                return Err(AppError::size_exceeded(format!(
                    "save '{}': exceeds the {max} byte limit",
                    options.original_name
                )));
            }
            if cancel.is_cancelled() {
                return Err(cancelled());
            }

            file.write_all(&chunk).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Content,
                    format!("save '{}': write failed", options.original_name),
                    e,
                )
            })?;
            progress(written);
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        fs::rename(temp.path(), &final_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Content,
                format!("save '{}': failed to move blob into place", options.original_name),
                e,
            )
        })?;
        temp.commit();

        debug!(path = %content_path, bytes = written, "Stored blob");
        Ok(SavedContent {
            content_path,
            size: written,
        })
    }

    async fn read(&self, content_path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(content_path)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| map_missing(e, "read", content_path))?;
        Ok(Bytes::from(data))
    }

    async fn read_stream(&self, content_path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(content_path)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| map_missing(e, "read", content_path))?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn delete(&self, content_path: &str) -> AppResult<()> {
        let full_path = self.resolve(content_path)?;
        fs::remove_file(&full_path)
            .await
            .map_err(|e| map_missing(e, "delete", content_path))?;
        debug!(path = %content_path, "Deleted blob");
        Ok(())
    }

    async fn exists(&self, content_path: &str) -> AppResult<bool> {
        let full_path = self.resolve(content_path)?;
        fs::try_exists(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Content,
                format!("exists: failed to stat blob '{content_path}'"),
                e,
            )
        })
    }

    async fn list_blobs(&self) -> AppResult<Vec<String>> {
        let mut blobs = Vec::new();
        for bucket in ContentBucket::ALL {
            let dir = self.root.join(bucket.dir_name());
            let mut entries = fs::read_dir(&dir).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Content,
                    format!("Failed to list bucket: {}", dir.display()),
                    e,
                )
            })?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    blobs.push(paths::content_path(bucket, &name));
                }
            }
        }
        blobs.sort();
        Ok(blobs)
    }

    async fn sweep_temp(&self) -> AppResult<usize> {
        let mut entries = fs::read_dir(self.temp_dir()).await?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let is_partial = entry.file_name().to_string_lossy().ends_with(TEMP_SUFFIX);
            if is_partial && entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "Removed leftover partial writes");
        }
        Ok(removed)
    }
}

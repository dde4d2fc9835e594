//! Content store trait for blob storage backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::mime::ContentBucket;
use crate::result::AppResult;

/// A byte stream type used for reading and writing blob contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Callback receiving the cumulative number of bytes written so far.
pub type ProgressFn<'a> = &'a (dyn Fn(u64) + Send + Sync);

/// Parameters for a streamed write.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Name the user uploaded the file as; only its extension is kept.
    pub original_name: String,
    /// Detected MIME type, used to choose the bucket.
    pub mime_type: String,
    /// Abort with `SizeExceeded` once more than this many bytes arrive.
    pub max_bytes: Option<u64>,
}

impl WriteOptions {
    /// Options without a byte cap.
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            max_bytes: None,
        }
    }

    /// Set the byte cap.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Bucket the blob will be stored under.
    pub fn bucket(&self) -> ContentBucket {
        ContentBucket::classify(&self.mime_type)
    }
}

/// Result of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedContent {
    /// Path of the blob, relative to the store root.
    pub content_path: String,
    /// Number of bytes persisted.
    pub size: u64,
}

/// Durable byte storage keyed by generated content paths.
///
/// The store knows nothing about directories or file records. Every write
/// gets a fresh, collision-free path; content paths are never reused.
/// Defined here in `assetdesk-core` and implemented in `assetdesk-storage`.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is usable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Persist a complete buffer and return its content path.
    async fn save(&self, data: Bytes, original_name: &str, mime_type: &str) -> AppResult<String>;

    /// Persist a byte stream, reporting progress and honoring cancellation.
    ///
    /// Nothing is visible under the returned path until the write has fully
    /// completed. On error or cancellation no blob remains.
    async fn save_stream(
        &self,
        stream: ByteStream,
        options: &WriteOptions,
        progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> AppResult<SavedContent>;

    /// Read a blob into memory.
    async fn read(&self, content_path: &str) -> AppResult<Bytes>;

    /// Open a blob as a byte stream.
    async fn read_stream(&self, content_path: &str) -> AppResult<ByteStream>;

    /// Delete a blob. Fails with `NotFound` if it does not exist.
    async fn delete(&self, content_path: &str) -> AppResult<()>;

    /// Check whether a blob exists.
    async fn exists(&self, content_path: &str) -> AppResult<bool>;

    /// List every blob's content path.
    async fn list_blobs(&self) -> AppResult<Vec<String>>;

    /// Remove partial writes left behind by an interrupted process.
    /// Returns the number of files removed.
    async fn sweep_temp(&self) -> AppResult<usize>;
}

//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use assetdesk_core::config::AppConfig;
use assetdesk_core::config::storage::StorageConfig;
use assetdesk_core::traits::ByteStream;
use assetdesk_core::types::DirectoryId;
use assetdesk_entity::directory::DirectoryRecord;
use assetdesk_entity::file::FileRecord;
use assetdesk_service::{FileManager, UploadSource};

/// Test application context
pub struct TestApp {
    /// The file manager under test
    pub manager: FileManager,
    /// Application config
    pub config: AppConfig,
    dir: TempDir,
}

impl TestApp {
    /// Create a new test application over a fresh data directory
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting the default config
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = AppConfig {
            storage: StorageConfig::rooted_at(dir.path().display().to_string()),
            ..AppConfig::default()
        };
        adjust(&mut config);

        let manager = FileManager::open(&config)
            .await
            .expect("Failed to open file manager");

        Self {
            manager,
            config,
            dir,
        }
    }

    /// Reopen the same data directory, as a restart would
    pub async fn reopen(self) -> Self {
        self.manager.close().await;
        let manager = FileManager::open(&self.config)
            .await
            .expect("Failed to reopen file manager");
        Self {
            manager,
            config: self.config,
            dir: self.dir,
        }
    }

    /// Root of the data directory
    pub fn data_root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory that holds content blobs
    pub fn content_root(&self) -> PathBuf {
        self.config.storage.content_root()
    }

    /// Create a directory, panicking on failure
    pub async fn mkdir(&self, name: &str, parent: Option<DirectoryId>) -> DirectoryRecord {
        self.manager
            .create_directory(name, parent)
            .await
            .unwrap_or_else(|e| panic!("Failed to create directory {name}: {e}"))
    }

    /// Upload bytes, panicking on failure
    pub async fn put(&self, dir: DirectoryId, name: &str, data: &[u8]) -> FileRecord {
        self.manager
            .upload_file(Bytes::copy_from_slice(data), name, dir)
            .await
            .unwrap_or_else(|e| panic!("Failed to upload {name}: {e}"))
    }

    /// Count regular files under the content root, temp area included
    pub fn content_file_count(&self) -> usize {
        fn walk(dir: &Path) -> usize {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return 0;
            };
            entries
                .flatten()
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() { walk(&path) } else { 1 }
                })
                .sum()
        }
        walk(&self.content_root())
    }
}

/// A one-chunk stream source that blocks until `gate` hands out a permit
pub fn gated_source(name: &str, data: &'static [u8], gate: Arc<Semaphore>) -> UploadSource {
    let stream: ByteStream = Box::pin(stream::once(async move {
        gate.acquire().await.map_err(std::io::Error::other)?.forget();
        Ok::<_, std::io::Error>(Bytes::from_static(data))
    }));
    UploadSource::from_stream(name, data.len() as u64, stream)
}

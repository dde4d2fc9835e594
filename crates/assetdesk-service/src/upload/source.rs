//! Upload candidates and their byte sources.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream;
use tokio_util::io::ReaderStream;

use assetdesk_core::error::{AppError, ErrorKind};
use assetdesk_core::result::AppResult;
use assetdesk_core::traits::ByteStream;

enum Payload {
    Bytes(Bytes),
    Path(PathBuf),
    Stream(ByteStream),
}

/// A file offered for upload: a name, a declared size, and its bytes.
pub struct UploadSource {
    name: String,
    size: u64,
    payload: Payload,
}

impl UploadSource {
    /// An in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            payload: Payload::Bytes(data),
        }
    }

    /// A file on local disk, read when the transfer starts.
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Content,
                format!("upload source {}: {e}", path.display()),
                e,
            )
        })?;
        if !metadata.is_file() {
            return Err(AppError::validation(format!(
                "upload source {}: not a regular file",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                AppError::validation(format!("upload source {}: no file name", path.display()))
            })?;
        Ok(Self {
            name,
            size: metadata.len(),
            payload: Payload::Path(path.to_path_buf()),
        })
    }

    /// A one-shot stream of `size` bytes. Stream sources cannot be retried.
    pub fn from_stream(name: impl Into<String>, size: u64, stream: ByteStream) -> Self {
        Self {
            name: name.into(),
            size,
            payload: Payload::Stream(stream),
        }
    }

    /// Name of the file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// A fresh copy of this source, if it can be read more than once.
    pub fn replay(&self) -> Option<Self> {
        let payload = match &self.payload {
            Payload::Bytes(data) => Payload::Bytes(data.clone()),
            Payload::Path(path) => Payload::Path(path.clone()),
            Payload::Stream(_) => return None,
        };
        Some(Self {
            name: self.name.clone(),
            size: self.size,
            payload,
        })
    }

    /// Open the source as a stream of chunks of at most `chunk_size` bytes.
    pub async fn open(self, chunk_size: usize) -> AppResult<ByteStream> {
        let chunk_size = chunk_size.max(1);
        match self.payload {
            Payload::Bytes(data) => {
                let chunks: Vec<Result<Bytes, std::io::Error>> = (0..data.len())
                    .step_by(chunk_size)
                    .map(|start| Ok(data.slice(start..(start + chunk_size).min(data.len()))))
                    .collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            Payload::Path(path) => {
                let file = tokio::fs::File::open(&path).await.map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Content,
                        format!("upload source {}: {e}", path.display()),
                        e,
                    )
                })?;
                Ok(Box::pin(ReaderStream::with_capacity(file, chunk_size)))
            }
            Payload::Stream(stream) => Ok(stream),
        }
    }
}

impl fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.payload {
            Payload::Bytes(_) => "bytes",
            Payload::Path(_) => "path",
            Payload::Stream(_) => "stream",
        };
        f.debug_struct("UploadSource")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("payload", &kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_bytes_are_chunked() {
        let source = UploadSource::from_bytes("a.txt", &b"abcdefghij"[..]);
        let chunks: Vec<Bytes> = source
            .open(4)
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![
            Bytes::from_static(b"abcd"),
            Bytes::from_static(b"efgh"),
            Bytes::from_static(b"ij"),
        ]);
    }

    #[tokio::test]
    async fn test_path_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let source = UploadSource::from_path(&path).await.unwrap();
        assert_eq!(source.name(), "notes.txt");
        assert_eq!(source.size(), 5);
        assert!(source.replay().is_some());
    }

    #[test]
    fn test_stream_is_one_shot() {
        let source = UploadSource::from_stream("a.bin", 1, Box::pin(stream::empty()));
        assert!(source.replay().is_none());
    }
}

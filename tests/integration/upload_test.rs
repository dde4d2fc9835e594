//! Integration tests for single and queued uploads.

mod helpers;

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Semaphore;

use assetdesk_core::ErrorKind;
use assetdesk_core::types::{DirectoryId, FileId};
use assetdesk_entity::upload::{UploadItem, UploadStatus};
use assetdesk_service::UploadSource;

fn count(items: &[UploadItem], status: UploadStatus) -> usize {
    items.iter().filter(|i| i.status == status).count()
}

#[tokio::test]
async fn test_upload_round_trip() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("docs", None).await;

    let file = app.put(dir.id, "notes.txt", b"hello world").await;
    assert_eq!(file.name, "notes.txt");
    assert_eq!(file.size, 11);
    assert_eq!(file.mime_type, "text/plain");
    assert_eq!(file.directory_id, dir.id);

    let data = app.manager.read_file_content(file.id).await.unwrap();
    assert_eq!(data, Bytes::from_static(b"hello world"));

    let listed = app.manager.list_files(dir.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, file.id);
}

#[tokio::test]
async fn test_same_name_uploads_are_distinct() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("docs", None).await;

    let first = app.put(dir.id, "a.txt", b"one").await;
    let second = app.put(dir.id, "a.txt", b"two").await;
    assert_ne!(first.id, second.id);
    assert_ne!(first.content_path, second.content_path);
    assert_eq!(app.manager.read_file_content(first.id).await.unwrap(), "one");
    assert_eq!(app.manager.read_file_content(second.id).await.unwrap(), "two");
}

#[tokio::test]
async fn test_upload_rejections() {
    let app = helpers::TestApp::with_config(|c| c.upload.max_file_size = 8).await;
    let dir = app.mkdir("docs", None).await;

    let err = app
        .manager
        .upload_file(Bytes::from_static(b"far too large"), "big.txt", dir.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SizeExceeded);

    let err = app
        .manager
        .upload_file(Bytes::from_static(b"MZ"), "setup.exe", dir.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidType);
    assert!(!app.manager.validate_file_type("setup.exe"));
    assert!(app.manager.validate_file_type("photo.PNG"));

    let err = app
        .manager
        .upload_file(Bytes::new(), "empty.txt", dir.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .manager
        .upload_file(Bytes::from_static(b"ok"), "ok.txt", DirectoryId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    assert_eq!(app.content_file_count(), 0);
    assert_eq!(app.manager.get_storage_stats().await.unwrap().total_files, 0);
}

#[tokio::test]
async fn test_delete_file_removes_content() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("docs", None).await;
    let file = app.put(dir.id, "a.txt", b"abc").await;
    assert_eq!(app.content_file_count(), 1);

    app.manager.delete_file(file.id).await.unwrap();
    assert_eq!(app.content_file_count(), 0);

    let err = app.manager.get_file(file.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = app.manager.delete_file(file.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = app.manager.delete_file(FileId::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // The directory is empty again.
    app.manager.delete_directory(dir.id).await.unwrap();
}

#[tokio::test]
async fn test_queue_respects_concurrency_limit() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("batch", None).await;
    let gate = Arc::new(Semaphore::new(0));
    let sources = (0..5)
        .map(|i| helpers::gated_source(&format!("f{i}.txt"), b"payload", gate.clone()))
        .collect();

    let uploads = app.manager.uploads();
    let ids = app.manager.enqueue_uploads(sources, dir.id).await.unwrap();
    assert_eq!(ids.len(), 5);

    let items = uploads.snapshot();
    assert_eq!(count(&items, UploadStatus::Uploading), 3);
    assert_eq!(count(&items, UploadStatus::Pending), 2);

    // Release one transfer at a time; the cap holds at every step.
    let mut rx = uploads.subscribe();
    for done in 1..=5 {
        gate.add_permits(1);
        let items = rx
            .wait_for(|items| count(items, UploadStatus::Completed) == done)
            .await
            .unwrap()
            .clone();
        assert!(count(&items, UploadStatus::Uploading) <= 3);
    }
    uploads.wait_idle().await;

    let files = app.manager.list_files(dir.id).await.unwrap();
    assert_eq!(files.len(), 5);
    let tree = app.manager.get_directory_tree().await.unwrap();
    assert_eq!(tree[0].file_count, 5);
    for id in ids {
        let item = uploads.get(id).unwrap();
        assert_eq!(item.progress, 100);
        assert!(item.result.is_some());
    }
}

#[tokio::test]
async fn test_cancelled_upload_leaves_nothing() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("batch", None).await;
    let gate = Arc::new(Semaphore::new(0));
    let uploads = app.manager.uploads();

    let ids = app
        .manager
        .enqueue_uploads(
            vec![
                helpers::gated_source("slow.txt", b"slow", gate.clone()),
                UploadSource::from_bytes("fast.txt", &b"fast"[..]),
            ],
            dir.id,
        )
        .await
        .unwrap();

    uploads.cancel(ids[0]).unwrap();
    gate.add_permits(1);
    uploads.wait_idle().await;

    assert_eq!(uploads.get(ids[0]).unwrap().status, UploadStatus::Cancelled);
    assert_eq!(uploads.get(ids[1]).unwrap().status, UploadStatus::Completed);

    let files = app.manager.list_files(dir.id).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "fast.txt");
    assert_eq!(app.content_file_count(), 1);
}

#[tokio::test]
async fn test_queue_from_disk_and_retry() {
    let app = helpers::TestApp::new().await;
    let target = app.mkdir("imports", None).await;
    let source_dir = tempfile::tempdir().unwrap();
    let good = source_dir.path().join("report.pdf");
    let bad = source_dir.path().join("tool.exe");
    tokio::fs::write(&good, b"%PDF-1.7").await.unwrap();
    tokio::fs::write(&bad, b"MZ").await.unwrap();

    let sources = vec![
        UploadSource::from_path(&good).await.unwrap(),
        UploadSource::from_path(&bad).await.unwrap(),
    ];
    let uploads = app.manager.uploads();
    let ids = app.manager.enqueue_uploads(sources, target.id).await.unwrap();
    uploads.wait_idle().await;

    let completed = uploads.get(ids[0]).unwrap();
    assert_eq!(completed.status, UploadStatus::Completed);
    let record = completed.result.unwrap();
    assert_eq!(record.mime_type, "application/pdf");
    assert_eq!(app.manager.read_file_content(record.id).await.unwrap(), "%PDF-1.7");

    let rejected = uploads.get(ids[1]).unwrap();
    assert_eq!(rejected.status, UploadStatus::Error);
    let err = uploads.retry(ids[1]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidType);

    assert_eq!(uploads.clear_finished(), 1);
    let remaining = uploads.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ids[1]);
    uploads.remove(ids[1]).unwrap();
    assert!(uploads.snapshot().is_empty());
}

#[tokio::test]
async fn test_enqueue_into_missing_directory() {
    let app = helpers::TestApp::new().await;
    let err = app
        .manager
        .enqueue_uploads(
            vec![UploadSource::from_bytes("a.txt", &b"a"[..])],
            DirectoryId::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(app.manager.uploads().snapshot().is_empty());
}

#[tokio::test]
async fn test_startup_sweeps_partial_writes() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("docs", None).await;
    app.put(dir.id, "kept.txt", b"kept").await;

    let temp = app.content_root().join(".tmp");
    tokio::fs::write(temp.join("stale.part"), b"partial").await.unwrap();
    assert_eq!(app.content_file_count(), 2);

    let app = app.reopen().await;
    assert_eq!(app.content_file_count(), 1);
    assert_eq!(app.manager.list_files(dir.id).await.unwrap().len(), 1);
}

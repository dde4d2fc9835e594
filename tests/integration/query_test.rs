//! Integration tests for search, listing, sorting, and selection.

mod helpers;

use assetdesk_core::ErrorKind;
use assetdesk_core::types::{SortDirection, SortField};
use assetdesk_service::query::{self, EntryId, FilterCriteria, ListEntry, Listable, SelectionState, SizeRange};

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let app = helpers::TestApp::new().await;
    let work = app.mkdir("work", None).await;
    let home = app.mkdir("home", None).await;
    app.put(work.id, "Q1 Report.pdf", b"%PDF-q1").await;
    app.put(work.id, "notes.txt", b"notes").await;
    app.put(home.id, "report-final.docx", b"docx").await;
    app.put(home.id, "holiday.jpg", b"\xff\xd8\xff").await;

    let found = app.manager.search_files("report", None).await.unwrap();
    let mut names: Vec<&str> = found.iter().map(|f| f.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Q1 Report.pdf", "report-final.docx"]);

    let scoped = app.manager.search_files("REPORT", Some(home.id)).await.unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].name, "report-final.docx");

    assert!(app.manager.search_files("missing", None).await.unwrap().is_empty());

    let err = app.manager.search_files("   ", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_sort_reversal_keeps_id_tiebreak() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("sizes", None).await;
    app.put(dir.id, "small.txt", b"1").await;
    app.put(dir.id, "tie-a.txt", b"12345").await;
    app.put(dir.id, "tie-b.txt", b"54321").await;
    app.put(dir.id, "large.txt", b"1234567890").await;
    let files = app.manager.list_files(dir.id).await.unwrap();

    let asc = query::sort(&files, SortField::Size, SortDirection::Asc);
    let desc = query::sort(&files, SortField::Size, SortDirection::Desc);
    assert_eq!(asc.first().unwrap().name, "small.txt");
    assert_eq!(desc.first().unwrap().name, "large.txt");

    // Equal sizes stay in ascending id order in both directions.
    let ties = |sorted: &[assetdesk_entity::file::FileRecord]| {
        sorted
            .iter()
            .filter(|f| f.size == 5)
            .map(|f| f.id)
            .collect::<Vec<_>>()
    };
    let asc_ties = ties(&asc);
    assert_eq!(asc_ties.len(), 2);
    assert!(asc_ties[0] < asc_ties[1]);
    assert_eq!(asc_ties, ties(&desc));

    let by_name = query::sort(&files, SortField::Name, SortDirection::Desc);
    let names: Vec<&str> = by_name.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["tie-b.txt", "tie-a.txt", "small.txt", "large.txt"]);
}

#[tokio::test]
async fn test_list_entries_directories_first() {
    let app = helpers::TestApp::new().await;
    let root = app.mkdir("root", None).await;
    app.mkdir("zeta", Some(root.id)).await;
    app.mkdir("Alpha", Some(root.id)).await;
    app.put(root.id, "b.txt", b"b").await;
    app.put(root.id, "a.png", b"\x89PNG\r\n\x1a\n").await;

    let entries = app.manager.list_entries(Some(root.id)).await.unwrap();
    let summary: Vec<(bool, &str)> = entries.iter().map(|e| (e.is_directory(), e.name())).collect();
    assert_eq!(
        summary,
        vec![(true, "Alpha"), (true, "zeta"), (false, "a.png"), (false, "b.txt")]
    );
    assert!(entries.iter().filter(|e| e.is_directory()).all(|e| e.size() == 0));
    assert_eq!(entries[0].type_key(), "inode/directory");

    let roots = app.manager.list_entries(None).await.unwrap();
    assert_eq!(roots.len(), 1);
    assert!(matches!(&roots[0], ListEntry::Directory(d) if d.id == root.id));
}

#[tokio::test]
async fn test_filter_listing() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("mixed", None).await;
    app.put(dir.id, "photo.png", b"\x89PNG\r\n\x1a\nxxxxxxxx").await;
    app.put(dir.id, "scan.jpg", b"\xff\xd8\xff").await;
    app.put(dir.id, "manual.pdf", b"%PDF-1.4 manual").await;
    let files = app.manager.list_files(dir.id).await.unwrap();

    let images = query::filter(
        &files,
        &FilterCriteria {
            types: vec!["image/*".to_string()],
            ..FilterCriteria::default()
        },
    );
    assert_eq!(images.len(), 2);

    let big_images = query::filter(
        &files,
        &FilterCriteria {
            types: vec!["image/*".to_string()],
            size_range: Some(SizeRange {
                min: Some(10),
                max: None,
            }),
            ..FilterCriteria::default()
        },
    );
    assert_eq!(big_images.len(), 1);
    assert_eq!(big_images[0].name, "photo.png");

    let by_ext = query::filter(
        &files,
        &FilterCriteria {
            types: vec!["pdf".to_string()],
            search_text: Some("MAN".to_string()),
            ..FilterCriteria::default()
        },
    );
    assert_eq!(by_ext.len(), 1);
    assert_eq!(by_ext[0].name, "manual.pdf");

    assert_eq!(query::filter(&files, &FilterCriteria::default()).len(), 3);
}

#[tokio::test]
async fn test_selection_follows_listing() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("pick", None).await;
    let sub = app.mkdir("sub", Some(dir.id)).await;
    for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
        app.put(dir.id, name, name.as_bytes()).await;
    }
    let listing = app.manager.list_entries(Some(dir.id)).await.unwrap();
    let ids: Vec<EntryId> = listing.iter().map(Listable::entry_id).collect();
    assert_eq!(ids[0], EntryId::Directory(sub.id));

    // Click b.txt, then shift-click the sub directory.
    let selection = SelectionState::new().select(&[ids[2]], false, &listing);
    let selection = selection.select_range(ids[0], &listing);
    assert_eq!(selection.len(), 3);
    assert_eq!(selection.directories().count(), 1);
    assert_eq!(selection.files().count(), 2);

    // Delete a selected file and reconcile against the new listing.
    let EntryId::File(b_id) = ids[2] else {
        panic!("expected a file entry");
    };
    app.manager.delete_file(b_id).await.unwrap();
    let listing = app.manager.list_entries(Some(dir.id)).await.unwrap();
    let selection = selection.reconcile(&listing);
    assert_eq!(selection.len(), 2);
    assert!(!selection.contains(ids[2]));

    let everything = selection.select_all(&listing);
    assert_eq!(everything.len(), listing.len());
    assert!(everything.clear().is_empty());
}

#[tokio::test]
async fn test_storage_stats() {
    let app = helpers::TestApp::new().await;
    let empty = app.manager.get_storage_stats().await.unwrap();
    assert_eq!(empty.total_files, 0);
    assert_eq!(empty.total_size, 0);
    assert!(empty.most_recent_upload.is_none());

    let a = app.mkdir("a", None).await;
    app.mkdir("b", Some(a.id)).await;
    app.put(a.id, "one.txt", b"1").await;
    let last = app.put(a.id, "three.txt", b"333").await;

    let stats = app.manager.get_storage_stats().await.unwrap();
    assert_eq!(stats.total_directories, 2);
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_size, 4);
    assert_eq!(stats.largest_file_size, 3);
    assert_eq!(
        stats.most_recent_upload.map(|at| at.timestamp_millis()),
        Some(last.created_at.timestamp_millis())
    );
}

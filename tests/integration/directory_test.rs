//! Integration tests for directory operations.

mod helpers;

use std::collections::HashSet;

use assetdesk_core::ErrorKind;
use assetdesk_core::types::DirectoryId;
use assetdesk_entity::directory::DirectoryTreeNode;

fn flatten(nodes: &[DirectoryTreeNode], out: &mut Vec<DirectoryTreeNode>) {
    for node in nodes {
        out.push(node.clone());
        flatten(&node.children, out);
    }
}

#[tokio::test]
async fn test_nested_directory_with_file() {
    let app = helpers::TestApp::new().await;
    let photos = app.mkdir("Photos", None).await;
    let year = app.mkdir("2024", Some(photos.id)).await;
    assert_eq!(year.full_path, "/Photos/2024");

    app.put(year.id, "x.jpg", b"\xff\xd8\xff\xe0jpeg").await;

    let tree = app.manager.get_directory_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "Photos");
    assert_eq!(tree[0].child_count, 1);
    assert_eq!(tree[0].file_count, 0);
    let child = &tree[0].children[0];
    assert_eq!(child.full_path, "/Photos/2024");
    assert_eq!(child.file_count, 1);
    assert_eq!(child.depth, 1);

    let err = app.manager.delete_directory(photos.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotEmpty);
    let err = app.manager.delete_directory(year.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotEmpty);
}

#[tokio::test]
async fn test_tree_is_a_forest() {
    let app = helpers::TestApp::new().await;
    let a = app.mkdir("a", None).await;
    let b = app.mkdir("b", None).await;
    let a1 = app.mkdir("a1", Some(a.id)).await;
    app.mkdir("a2", Some(a.id)).await;
    app.mkdir("deep", Some(a1.id)).await;
    app.mkdir("b1", Some(b.id)).await;

    let tree = app.manager.get_directory_tree().await.unwrap();
    let mut nodes = Vec::new();
    flatten(&tree, &mut nodes);
    assert_eq!(nodes.len(), 6);
    assert_eq!(tree.iter().map(DirectoryTreeNode::subtree_len).sum::<usize>(), 6);
    let a_node = tree.iter().find(|n| n.id == a.id).unwrap();
    assert_eq!(a_node.subtree_len(), 4);
    assert_eq!(a_node.find(a1.id).unwrap().children.len(), 1);

    let ids: HashSet<DirectoryId> = nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids.len(), nodes.len());
    for node in &nodes {
        match node.parent_id {
            None => assert_eq!(node.depth, 0),
            Some(parent) => {
                assert!(ids.contains(&parent));
                let parent = nodes.iter().find(|n| n.id == parent).unwrap();
                assert_eq!(node.depth, parent.depth + 1);
                assert_eq!(node.full_path, format!("{}/{}", parent.full_path, node.name));
            }
        }
        assert_eq!(node.child_count as usize, node.children.len());
    }
}

#[tokio::test]
async fn test_sibling_names_are_unique() {
    let app = helpers::TestApp::new().await;
    let docs = app.mkdir("Docs", None).await;

    let err = app.manager.create_directory("Docs", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameConflict);

    // Same name under a different parent is fine.
    let nested = app.mkdir("Docs", Some(docs.id)).await;
    assert_eq!(nested.full_path, "/Docs/Docs");

    let err = app.manager.create_directory("  ", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = app.manager.create_directory("a/b", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_racing_creates_yield_one_directory() {
    let app = helpers::TestApp::new().await;
    let parent = app.mkdir("shared", None).await;

    let (first, second) = tokio::join!(
        app.manager.create_directory("Reports", Some(parent.id)),
        app.manager.create_directory("Reports", Some(parent.id)),
    );
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let err = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(err.kind, ErrorKind::NameConflict);

    let children = app.manager.index().children(Some(parent.id));
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].full_path, "/shared/Reports");
}

#[tokio::test]
async fn test_create_under_missing_parent() {
    let app = helpers::TestApp::new().await;
    let err = app
        .manager
        .create_directory("orphan", Some(DirectoryId::new()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(app.manager.get_directory_tree().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_updates_descendant_paths() {
    let app = helpers::TestApp::new().await;
    let photos = app.mkdir("Photos", None).await;
    let year = app.mkdir("2024", Some(photos.id)).await;
    let trip = app.mkdir("Trip", Some(year.id)).await;

    let renamed = app.manager.rename_directory(photos.id, "Pictures").await.unwrap();
    assert_eq!(renamed.full_path, "/Pictures");

    let trip = app.manager.get_directory(trip.id).await.unwrap();
    assert_eq!(trip.full_path, "/Pictures/2024/Trip");
}

#[tokio::test]
async fn test_move_directory() {
    let app = helpers::TestApp::new().await;
    let a = app.mkdir("a", None).await;
    let b = app.mkdir("b", None).await;
    let child = app.mkdir("child", Some(a.id)).await;
    app.mkdir("leaf", Some(child.id)).await;

    let moved = app.manager.move_directory(child.id, Some(b.id)).await.unwrap();
    assert_eq!(moved.full_path, "/b/child");
    let tree = app.manager.get_directory_tree().await.unwrap();
    let b_node = tree.iter().find(|n| n.id == b.id).unwrap();
    assert_eq!(b_node.children[0].children[0].full_path, "/b/child/leaf");

    // Into itself or a descendant.
    let err = app.manager.move_directory(b.id, Some(child.id)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = app.manager.move_directory(b.id, Some(b.id)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let root = app.manager.move_directory(child.id, None).await.unwrap();
    assert_eq!(root.full_path, "/child");
    assert_eq!(app.manager.get_directory_tree().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_empty_directory() {
    let app = helpers::TestApp::new().await;
    let dir = app.mkdir("tmp", None).await;
    app.manager.delete_directory(dir.id).await.unwrap();

    let err = app.manager.get_directory(dir.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = app.manager.delete_directory(dir.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_recursive_delete_removes_content() {
    let app = helpers::TestApp::new().await;
    let root = app.mkdir("root", None).await;
    let inner = app.mkdir("inner", Some(root.id)).await;
    let keep = app.mkdir("keep", None).await;
    app.put(root.id, "a.txt", b"a").await;
    app.put(inner.id, "b.txt", b"bb").await;
    app.put(keep.id, "c.txt", b"ccc").await;
    assert_eq!(app.content_file_count(), 3);

    let removed = app.manager.delete_directory_recursive(root.id).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(app.content_file_count(), 1);

    let tree = app.manager.get_directory_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].id, keep.id);

    let stats = app.manager.get_storage_stats().await.unwrap();
    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.total_directories, 1);
    assert_eq!(stats.total_size, 3);
}

#[tokio::test]
async fn test_tree_survives_restart() {
    let app = helpers::TestApp::new().await;
    let photos = app.mkdir("Photos", None).await;
    let year = app.mkdir("2024", Some(photos.id)).await;
    app.put(year.id, "x.jpg", b"jpeg").await;

    let app = app.reopen().await;
    assert!(app.manager.health_check().await.unwrap());
    let tree = app.manager.get_directory_tree().await.unwrap();
    assert_eq!(tree[0].children[0].full_path, "/Photos/2024");
    assert_eq!(tree[0].children[0].file_count, 1);
}

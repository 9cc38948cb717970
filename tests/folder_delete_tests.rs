mod common;

use std::sync::Arc;

use uuid::Uuid;

use common::MockObjectStorage;
use easydocs_server::db::AppState;
use easydocs_server::files::models::{FileKind, FileRecord};
use easydocs_server::folder::models::Folder;
use easydocs_server::folder::service::{delete_folder_tree, FolderDeleteError, MAX_FOLDER_DEPTH};

fn upload(owner: Uuid, folder: &Folder, name: &str) -> FileRecord {
    FileRecord::uploaded(
        owner,
        name.to_string(),
        FileKind::Pdf,
        64,
        format!("{}/{}", folder.name, name),
        Some(folder.id),
        None,
    )
}

async fn seed_tree(state: &AppState, storage: &MockObjectStorage, owner: Uuid) -> Folder {
    let root = Folder::new(owner, "Docs".to_string(), None, None);
    let sub = Folder::new(owner, "Archive".to_string(), None, Some(root.id));
    state.store.insert_folder(&root).await.unwrap();
    state.store.insert_folder(&sub).await.unwrap();

    for file in [
        upload(owner, &root, "a.pdf"),
        upload(owner, &root, "b.pdf"),
        upload(owner, &sub, "c.pdf"),
    ] {
        storage.insert_object(&file.file_path, b"pdf");
        state.store.insert_file(&file).await.unwrap();
    }

    // orphaned object with no database record, only the sweep can find it
    storage.insert_object("Docs/ghost.tmp", b"tmp");
    root
}

#[actix_web::test]
async fn test_recursive_delete_removes_records_and_objects() {
    let storage = Arc::new(MockObjectStorage::new());
    let state = common::test_state(storage.clone());
    let owner = Uuid::new_v4();
    let root = seed_tree(&state, &storage, owner).await;

    let report = delete_folder_tree(&state.store, &state.storage, &root)
        .await
        .unwrap();

    assert_eq!(report.folders_deleted, 2);
    assert_eq!(report.files_deleted, 3);
    assert_eq!(report.storage_failures, 0);

    assert!(state.store.list_files(&owner).await.unwrap().is_empty());
    assert!(state.store.list_folders(&owner, None).await.unwrap().is_empty());
    assert_eq!(storage.object_count(), 0);

    let deleted = storage.deleted_paths();
    for path in ["Docs/a.pdf", "Docs/b.pdf", "Archive/c.pdf", "Docs/ghost.tmp"] {
        assert!(deleted.iter().any(|p| p == path), "missing delete for {}", path);
    }
}

#[actix_web::test]
async fn test_storage_failures_never_stop_record_deletion() {
    let storage = Arc::new(MockObjectStorage::failing_deletes());
    let state = common::test_state(storage.clone());
    let owner = Uuid::new_v4();
    let root = seed_tree(&state, &storage, owner).await;

    let report = delete_folder_tree(&state.store, &state.storage, &root)
        .await
        .unwrap();

    assert_eq!(report.folders_deleted, 2);
    assert_eq!(report.files_deleted, 3);
    assert!(report.storage_failures >= 4);

    // database deletion proceeded regardless
    assert!(state.store.list_files(&owner).await.unwrap().is_empty());
    assert!(state.store.list_folders(&owner, None).await.unwrap().is_empty());

    // every known path was attempted, plus the sweep
    let deleted = storage.deleted_paths();
    for path in ["Docs/a.pdf", "Docs/b.pdf", "Archive/c.pdf", "Docs/ghost.tmp"] {
        assert!(deleted.iter().any(|p| p == path), "missing attempt for {}", path);
    }
}

#[actix_web::test]
async fn test_depth_guard_rejects_degenerate_trees() {
    let storage = Arc::new(MockObjectStorage::new());
    let state = common::test_state(storage);
    let owner = Uuid::new_v4();

    let root = Folder::new(owner, "depth-0".to_string(), None, None);
    state.store.insert_folder(&root).await.unwrap();
    let mut parent = root.id;
    for depth in 1..=MAX_FOLDER_DEPTH {
        let folder = Folder::new(owner, format!("depth-{}", depth), None, Some(parent));
        state.store.insert_folder(&folder).await.unwrap();
        parent = folder.id;
    }

    let result = delete_folder_tree(&state.store, &state.storage, &root).await;
    assert!(matches!(result, Err(FolderDeleteError::TooDeep)));
}

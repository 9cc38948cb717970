//! Recursive folder deletion.
//!
//! Operates purely on the data model, decoupled from any request concern.
//! Deletion is two-phase per folder: per-record storage deletes using the
//! known paths, then a prefix sweep that catches orphaned objects with no
//! database record, then the records themselves, depth-first through the
//! subfolder tree. Storage failures are logged and counted, never fatal.

use futures::future::BoxFuture;
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::models::Folder;
use crate::db::{DocumentStore, StoreError};
use crate::storage::ObjectStorage;

/// Parent links form a tree in the store; the cap guards against a
/// corrupted hierarchy.
pub const MAX_FOLDER_DEPTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum FolderDeleteError {
    #[error("folder tree exceeds the maximum depth of {MAX_FOLDER_DEPTH}")]
    TooDeep,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct FolderDeletionReport {
    pub folders_deleted: u32,
    pub files_deleted: u32,
    pub storage_failures: u32,
}

impl FolderDeletionReport {
    fn absorb(&mut self, other: FolderDeletionReport) {
        self.folders_deleted += other.folders_deleted;
        self.files_deleted += other.files_deleted;
        self.storage_failures += other.storage_failures;
    }
}

pub async fn delete_folder_tree(
    store: &Arc<dyn DocumentStore + Send + Sync>,
    storage: &Arc<dyn ObjectStorage + Send + Sync>,
    folder: &Folder,
) -> Result<FolderDeletionReport, FolderDeleteError> {
    delete_folder_at_depth(store.clone(), storage.clone(), folder.clone(), 0).await
}

fn delete_folder_at_depth(
    store: Arc<dyn DocumentStore + Send + Sync>,
    storage: Arc<dyn ObjectStorage + Send + Sync>,
    folder: Folder,
    depth: usize,
) -> BoxFuture<'static, Result<FolderDeletionReport, FolderDeleteError>> {
    Box::pin(async move {
        if depth >= MAX_FOLDER_DEPTH {
            return Err(FolderDeleteError::TooDeep);
        }

        let mut report = FolderDeletionReport::default();

        // phase one: per-record deletes using the known paths
        let files = store.list_files_in_folder(&folder.id).await?;
        for file in files {
            if !file.file_path.is_empty() {
                if let Err(e) = storage.delete(&file.file_path).await {
                    error!("Failed to delete storage object {}: {}", file.file_path, e);
                    report.storage_failures += 1;
                }
            }
            store.delete_file(&file.id).await?;
            report.files_deleted += 1;
        }

        // phase two: prefix sweep for objects the records no longer cover
        let prefix = format!("{}/", folder.name);
        match storage.list(&prefix).await {
            Ok(objects) => {
                for object in objects {
                    let path = format!("{}{}", prefix, object.name);
                    if let Err(e) = storage.delete(&path).await {
                        error!("Failed to sweep storage object {}: {}", path, e);
                        report.storage_failures += 1;
                    }
                }
            }
            Err(e) => {
                error!("Failed to list storage prefix {}: {}", prefix, e);
                report.storage_failures += 1;
            }
        }

        let subfolders = store.list_folders(&folder.owner_id, Some(&folder.id)).await?;
        for subfolder in subfolders {
            let nested =
                delete_folder_at_depth(store.clone(), storage.clone(), subfolder, depth + 1)
                    .await?;
            report.absorb(nested);
        }

        store.delete_folder(&folder.id).await?;
        report.folders_deleted += 1;
        info!(
            "Deleted folder '{}' ({} files, {} folders in subtree)",
            folder.name, report.files_deleted, report.folders_deleted
        );
        Ok(report)
    })
}

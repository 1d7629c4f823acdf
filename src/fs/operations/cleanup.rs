//! Removal of folders left empty by a move.

use tracing::{info, warn};

use crate::fs::operations::walk::WalkError;
use crate::fs::store::RemoteStore;

/// Result of an empty-folder cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Folders that were deleted
    pub deleted: Vec<String>,
    /// Folders that still had children
    pub kept: Vec<String>,
    /// Folders that could not be listed or deleted
    pub errors: Vec<WalkError>,
}

/// Delete every folder in `folder_ids` that has no remaining children.
///
/// Folders are handled in the given order, so passing the post-order list
/// from a walk lets a parent be deleted once its emptied sub-folders are gone.
/// Only call this after every pending move has been flushed.
pub async fn remove_empty_folders<S: RemoteStore + ?Sized>(
    store: &S,
    folder_ids: &[String],
) -> CleanupReport {
    let mut report = CleanupReport::default();

    for folder_id in folder_ids {
        let page = match store.list_children(folder_id, None).await {
            Ok(page) => page,
            Err(error) => {
                warn!(folder = %folder_id, %error, "cannot list folder for cleanup");
                report.errors.push(WalkError {
                    folder_id: folder_id.clone(),
                    error,
                });
                continue;
            }
        };

        if !page.nodes.is_empty() || page.has_more() {
            report.kept.push(folder_id.clone());
            continue;
        }

        match store.delete(folder_id).await {
            Ok(()) => {
                info!(folder = %folder_id, "deleted empty folder");
                report.deleted.push(folder_id.clone());
            }
            Err(error) => {
                warn!(folder = %folder_id, %error, "failed to delete folder");
                report.errors.push(WalkError {
                    folder_id: folder_id.clone(),
                    error,
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryStore, ROOT_ID};

    #[tokio::test]
    async fn test_deletes_only_empty_folders() {
        let store = MemoryStore::new("me@example.com");
        let empty = store.add_folder(ROOT_ID, "empty");
        let full = store.add_folder(ROOT_ID, "full");
        store.add_file(&full, "keep.txt");

        let report = remove_empty_folders(&store, &[empty.clone(), full.clone()]).await;

        assert_eq!(report.deleted, vec![empty.clone()]);
        assert_eq!(report.kept, vec![full.clone()]);
        assert!(!store.exists(&empty));
        assert!(store.exists(&full));
    }

    #[tokio::test]
    async fn test_parent_deleted_after_emptied_child() {
        let store = MemoryStore::new("me@example.com");
        let parent = store.add_folder(ROOT_ID, "parent");
        let child = store.add_folder(&parent, "child");

        let report = remove_empty_folders(&store, &[child.clone(), parent.clone()]).await;

        assert_eq!(report.deleted, vec![child, parent]);
    }

    #[tokio::test]
    async fn test_errors_do_not_stop_cleanup() {
        let store = MemoryStore::new("me@example.com");
        let locked = store.add_folder(ROOT_ID, "locked");
        let broken = store.add_folder(ROOT_ID, "broken");
        let empty = store.add_folder(ROOT_ID, "empty");
        store.fail_delete(&locked);
        store.fail_listing(&broken, 0);

        let report =
            remove_empty_folders(&store, &[locked.clone(), broken.clone(), empty.clone()]).await;

        assert_eq!(report.deleted, vec![empty]);
        let failed: Vec<_> = report.errors.iter().map(|e| e.folder_id.clone()).collect();
        assert_eq!(failed, vec![locked.clone(), broken]);
        assert!(store.exists(&locked));
    }
}

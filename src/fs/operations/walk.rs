//! Depth-first, page-by-page traversal of a remote folder tree.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::{DriveError, Result};
use crate::fs::node::Node;
use crate::fs::store::RemoteStore;

/// Callbacks invoked by [`TreeWalker`].
#[async_trait]
pub trait Visitor: Send {
    /// Called for every child that is not a folder.
    async fn visit_file(&mut self, node: &Node);

    /// Called for every folder child before descending into it.
    ///
    /// `Ok(false)` skips the subtree. An error skips the subtree and is
    /// recorded in the [`WalkReport`].
    async fn enter_folder(&mut self, _node: &Node) -> Result<bool> {
        Ok(true)
    }

    /// Called once the subtree of a folder accepted by `enter_folder` is done.
    async fn leave_folder(&mut self, _node: &Node) {}
}

/// A folder whose traversal stopped early.
#[derive(Debug)]
pub struct WalkError {
    /// Folder being listed or entered when the error happened
    pub folder_id: String,
    /// The error
    pub error: DriveError,
}

/// Summary of one traversal.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Every visited folder, each listed after all of its descendants
    pub visited_folders: Vec<String>,
    /// Folders whose traversal was cut short
    pub errors: Vec<WalkError>,
    /// Number of files handed to the visitor
    pub files_visited: usize,
    /// Number of listing pages fetched
    pub pages_fetched: usize,
}

impl WalkReport {
    /// Check if every folder was listed completely.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

struct WalkState {
    report: WalkReport,
    seen: HashSet<String>,
}

/// Recursive walker over a [`RemoteStore`].
///
/// Children are processed in listing order; a folder's subtree is finished
/// before its next sibling is visited. A listing error ends the traversal of
/// that folder only.
pub struct TreeWalker<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RemoteStore + ?Sized> TreeWalker<'a, S> {
    /// Create a walker over `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Walk the tree below `folder_id`.
    ///
    /// `folder_id` itself is not passed to the visitor but is the last entry
    /// of [`WalkReport::visited_folders`].
    pub async fn walk<V: Visitor>(&self, folder_id: &str, visitor: &mut V) -> WalkReport {
        let mut state = WalkState {
            report: WalkReport::default(),
            seen: HashSet::new(),
        };
        state.seen.insert(folder_id.to_string());
        self.walk_folder(folder_id, visitor, &mut state).await;
        state.report
    }

    fn walk_folder<'f, V: Visitor>(
        &'f self,
        folder_id: &'f str,
        visitor: &'f mut V,
        state: &'f mut WalkState,
    ) -> BoxFuture<'f, ()> {
        async move {
            let mut page_token: Option<String> = None;

            loop {
                let page = match self
                    .store
                    .list_children(folder_id, page_token.as_deref())
                    .await
                {
                    Ok(page) => page,
                    Err(error) => {
                        warn!(folder = folder_id, %error, "listing failed, skipping rest of folder");
                        state.report.errors.push(WalkError {
                            folder_id: folder_id.to_string(),
                            error,
                        });
                        break;
                    }
                };
                state.report.pages_fetched += 1;
                debug!(folder = folder_id, items = page.nodes.len(), "fetched page");

                for node in &page.nodes {
                    if !node.is_folder() {
                        state.report.files_visited += 1;
                        visitor.visit_file(node).await;
                        continue;
                    }

                    if !state.seen.insert(node.id.clone()) {
                        debug!(folder = %node.id, "folder already visited");
                        continue;
                    }

                    match visitor.enter_folder(node).await {
                        Ok(true) => {
                            self.walk_folder(&node.id, visitor, state).await;
                            visitor.leave_folder(node).await;
                        }
                        Ok(false) => debug!(folder = %node.id, "subtree skipped"),
                        Err(error) => {
                            warn!(folder = %node.id, %error, "cannot enter folder");
                            state.report.errors.push(WalkError {
                                folder_id: node.id.clone(),
                                error,
                            });
                        }
                    }
                }

                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }

            state.report.visited_folders.push(folder_id.to_string());
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryStore, ROOT_ID};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip: Option<String>,
        fail: Option<String>,
    }

    #[async_trait]
    impl Visitor for Recorder {
        async fn visit_file(&mut self, node: &Node) {
            self.events.push(format!("file:{}", node.name));
        }

        async fn enter_folder(&mut self, node: &Node) -> Result<bool> {
            if self.fail.as_deref() == Some(node.name.as_str()) {
                return Err(DriveError::Custom("nope".into()));
            }
            self.events.push(format!("enter:{}", node.name));
            Ok(self.skip.as_deref() != Some(node.name.as_str()))
        }

        async fn leave_folder(&mut self, node: &Node) {
            self.events.push(format!("leave:{}", node.name));
        }
    }

    /// root
    /// ├── a/
    /// │   ├── a1.txt
    /// │   └── b/
    /// │       └── b1.txt
    /// ├── r1.txt
    /// └── c/
    fn sample_tree(store: &MemoryStore) -> (String, String, String) {
        let a = store.add_folder(ROOT_ID, "a");
        store.add_file(&a, "a1.txt");
        let b = store.add_folder(&a, "b");
        store.add_file(&b, "b1.txt");
        store.add_file(ROOT_ID, "r1.txt");
        let c = store.add_folder(ROOT_ID, "c");
        (a, b, c)
    }

    #[tokio::test]
    async fn test_visits_every_node_once_in_preorder() {
        let store = MemoryStore::new("me@example.com");
        let (a, b, c) = sample_tree(&store);

        let mut recorder = Recorder::default();
        let report = TreeWalker::new(&store).walk(ROOT_ID, &mut recorder).await;

        assert_eq!(
            recorder.events,
            vec![
                "enter:a",
                "file:a1.txt",
                "enter:b",
                "file:b1.txt",
                "leave:b",
                "leave:a",
                "file:r1.txt",
                "enter:c",
                "leave:c",
            ]
        );
        assert_eq!(report.files_visited, 3);
        assert!(report.is_complete());
        assert_eq!(
            report.visited_folders,
            vec![b, a, c, ROOT_ID.to_string()]
        );
    }

    #[tokio::test]
    async fn test_folder_listed_after_descendants() {
        let store = MemoryStore::new("me@example.com").with_page_size(1);
        let (a, b, _) = sample_tree(&store);

        let mut recorder = Recorder::default();
        let report = TreeWalker::new(&store).walk(ROOT_ID, &mut recorder).await;

        let pos = |id: &str| report.visited_folders.iter().position(|f| f == id).unwrap();
        assert!(pos(&b) < pos(&a));
        assert_eq!(pos(ROOT_ID), report.visited_folders.len() - 1);
        let unique: HashSet<_> = report.visited_folders.iter().collect();
        assert_eq!(unique.len(), report.visited_folders.len());
    }

    #[tokio::test]
    async fn test_follows_every_page() {
        let store = MemoryStore::new("me@example.com").with_page_size(3);
        for i in 0..10 {
            store.add_file(ROOT_ID, &format!("f{i}"));
        }

        let mut recorder = Recorder::default();
        let report = TreeWalker::new(&store).walk(ROOT_ID, &mut recorder).await;

        assert_eq!(report.files_visited, 10);
        assert_eq!(report.pages_fetched, 4);
        assert_eq!(recorder.events.last().map(String::as_str), Some("file:f9"));
    }

    #[tokio::test]
    async fn test_listing_error_aborts_current_folder_only() {
        let store = MemoryStore::new("me@example.com").with_page_size(2);
        let a = store.add_folder(ROOT_ID, "a");
        for i in 0..6 {
            store.add_file(&a, &format!("a{i}"));
        }
        store.add_file(ROOT_ID, "after");
        store.fail_listing(&a, 1);

        let mut recorder = Recorder::default();
        let report = TreeWalker::new(&store).walk(ROOT_ID, &mut recorder).await;

        assert_eq!(
            recorder.events,
            vec!["enter:a", "file:a0", "file:a1", "leave:a", "file:after"]
        );
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].folder_id, a);
        assert!(report.visited_folders.contains(&a));
    }

    #[tokio::test]
    async fn test_skipped_and_failed_subtrees() {
        let store = MemoryStore::new("me@example.com");
        let (_, b, c) = sample_tree(&store);

        let mut recorder = Recorder {
            skip: Some("b".into()),
            fail: Some("c".into()),
            ..Recorder::default()
        };
        let report = TreeWalker::new(&store).walk(ROOT_ID, &mut recorder).await;

        assert!(!recorder.events.contains(&"file:b1.txt".to_string()));
        assert!(!recorder.events.contains(&"leave:b".to_string()));
        assert!(!report.visited_folders.contains(&b));
        assert!(!report.visited_folders.contains(&c));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].folder_id, c);
    }

    #[tokio::test]
    async fn test_missing_root_is_reported() {
        let store = MemoryStore::new("me@example.com");
        let mut recorder = Recorder::default();
        let report = TreeWalker::new(&store).walk("nope", &mut recorder).await;

        assert!(recorder.events.is_empty());
        assert!(report.errors[0].error.is_not_found());
        assert_eq!(report.visited_folders, vec!["nope".to_string()]);
    }
}

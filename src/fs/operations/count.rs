//! Counting files per owner.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::fs::node::Node;
use crate::fs::operations::walk::{TreeWalker, Visitor, WalkReport};
use crate::fs::store::RemoteStore;

/// Files per primary-owner e-mail.
#[derive(Debug, Default, Serialize)]
pub struct OwnerCounts {
    /// Count per owner, sorted by e-mail
    #[serde(flatten)]
    pub by_owner: BTreeMap<String, usize>,
    /// Files listed without any owner
    #[serde(skip)]
    pub unowned: usize,
    /// Traversal summary
    #[serde(skip)]
    pub walk: WalkReport,
}

impl OwnerCounts {
    /// Total number of files counted.
    pub fn total(&self) -> usize {
        self.by_owner.values().sum::<usize>() + self.unowned
    }
}

#[derive(Default)]
struct OwnerCounter {
    by_owner: BTreeMap<String, usize>,
    unowned: usize,
}

#[async_trait]
impl Visitor for OwnerCounter {
    async fn visit_file(&mut self, node: &Node) {
        match node.primary_owner() {
            Some(owner) => *self.by_owner.entry(owner.email_address.clone()).or_default() += 1,
            None => self.unowned += 1,
        }
    }
}

/// Count the files below `folder_id` by primary owner.
///
/// Folders that fail to list are reported in [`OwnerCounts::walk`]; the
/// counts cover everything that was listed.
pub async fn count_owners<S: RemoteStore + ?Sized>(store: &S, folder_id: &str) -> OwnerCounts {
    let mut counter = OwnerCounter::default();
    let walk = TreeWalker::new(store).walk(folder_id, &mut counter).await;

    OwnerCounts {
        by_owner: counter.by_owner,
        unowned: counter.unowned,
        walk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryStore, ROOT_ID};

    #[tokio::test]
    async fn test_counts_by_primary_owner() {
        let store = MemoryStore::new("me@example.com").with_page_size(2);
        let shared = store.add_folder_owned_by(ROOT_ID, "shared", "bob@example.com");
        store.add_file(ROOT_ID, "a");
        store.add_file(&shared, "b");
        store.add_file_owned_by(&shared, "c", "bob@example.com");
        store.add_file_owned_by(&shared, "d", "bob@example.com");
        store.add_file_owned_by(&shared, "e", "alice@example.com");
        store.add_unowned_file(&shared, "f");

        let counts = count_owners(&store, ROOT_ID).await;

        assert_eq!(counts.by_owner.get("me@example.com"), Some(&2));
        assert_eq!(counts.by_owner.get("bob@example.com"), Some(&2));
        assert_eq!(counts.by_owner.get("alice@example.com"), Some(&1));
        assert_eq!(counts.unowned, 1);
        assert_eq!(counts.total(), 6);
        assert!(counts.walk.is_complete());
    }

    #[tokio::test]
    async fn test_json_is_sorted_by_owner() {
        let store = MemoryStore::new("me@example.com");
        store.add_file_owned_by(ROOT_ID, "z", "zed@example.com");
        store.add_file_owned_by(ROOT_ID, "a", "amy@example.com");

        let counts = count_owners(&store, ROOT_ID).await;
        let json = serde_json::to_string(&counts).unwrap();

        assert_eq!(json, r#"{"amy@example.com":1,"zed@example.com":1}"#);
    }

    #[tokio::test]
    async fn test_partial_counts_on_listing_error() {
        let store = MemoryStore::new("me@example.com");
        let broken = store.add_folder(ROOT_ID, "broken");
        store.add_file(&broken, "hidden");
        store.add_file(ROOT_ID, "visible");
        store.fail_listing(&broken, 0);

        let counts = count_owners(&store, ROOT_ID).await;

        assert_eq!(counts.total(), 1);
        assert_eq!(counts.walk.errors.len(), 1);
    }
}

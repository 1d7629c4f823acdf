//! Transferring ownership of caller-owned files.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{DriveError, Result};
use crate::fs::mutation::Mutation;
use crate::fs::node::Node;
use crate::fs::operations::batch::{BatchMutator, MAX_BATCH_SIZE, MutationSummary};
use crate::fs::operations::walk::{TreeWalker, Visitor, WalkReport};
use crate::fs::store::RemoteStore;
use crate::progress::OutcomeCallback;

/// Settings for [`transfer_ownership`].
pub struct TransferOptions {
    /// Mutations per batch, clamped to `1..=MAX_BATCH_SIZE`
    pub batch_size: usize,
    /// Called for every mutation outcome
    pub on_outcome: Option<OutcomeCallback>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            on_outcome: None,
        }
    }
}

/// Result of an ownership transfer run.
#[derive(Debug)]
pub struct TransferReport {
    /// Traversal summary
    pub walk: WalkReport,
    /// Per-file transfer outcomes
    pub mutations: MutationSummary,
    /// Files left alone because the caller is not their primary owner
    pub skipped: usize,
}

struct TransferVisitor<'a, S: RemoteStore + ?Sized> {
    mutator: BatchMutator<'a, S>,
    new_owner: String,
    skipped: usize,
}

#[async_trait]
impl<'a, S: RemoteStore + ?Sized> Visitor for TransferVisitor<'a, S> {
    async fn visit_file(&mut self, node: &Node) {
        if !node.owned_by_me() {
            debug!(file = %node.id, "not owned by caller, skipping");
            self.skipped += 1;
            return;
        }
        let mutation = Mutation::TransferOwnership {
            file_id: node.id.clone(),
            new_owner: self.new_owner.clone(),
        };
        self.mutator.add(mutation).await;
    }

    // Folders are always entered: their contents may belong to the caller
    // even when the folder does not.
    async fn enter_folder(&mut self, node: &Node) -> Result<bool> {
        super::announce_folder(&node.name);
        Ok(true)
    }
}

/// Hand every caller-owned file below `folder_id` over to `new_owner`.
///
/// The final partial batch is always flushed, and listing errors only cut
/// the affected folder short.
pub async fn transfer_ownership<S: RemoteStore + ?Sized>(
    store: &S,
    folder_id: &str,
    new_owner: &str,
    options: TransferOptions,
) -> Result<TransferReport> {
    let new_owner = new_owner.trim();
    if new_owner.is_empty() || !new_owner.contains('@') {
        return Err(DriveError::InvalidArgument(format!(
            "not an e-mail address: '{}'",
            new_owner
        )));
    }

    super::announce_root(store, folder_id).await;

    let mut mutator = BatchMutator::with_capacity(store, options.batch_size);
    if let Some(callback) = options.on_outcome {
        mutator = mutator.on_outcome(callback);
    }

    let mut visitor = TransferVisitor {
        mutator,
        new_owner: new_owner.to_string(),
        skipped: 0,
    };
    let walk = TreeWalker::new(store).walk(folder_id, &mut visitor).await;
    let mutations = visitor.mutator.finish().await;

    Ok(TransferReport {
        walk,
        mutations,
        skipped: visitor.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryStore, ROOT_ID};

    #[tokio::test]
    async fn test_recurses_into_foreign_folder() {
        let store = MemoryStore::new("me@example.com");
        let foreign = store.add_folder_owned_by(ROOT_ID, "shared", "bob@example.com");
        let mine = store.add_file(&foreign, "mine.txt");

        let report = transfer_ownership(&store, ROOT_ID, "carol@example.com", TransferOptions::default())
            .await
            .unwrap();

        assert_eq!(store.batch_sizes(), vec![1]);
        assert_eq!(report.mutations.succeeded, 1);
        assert_eq!(report.mutations.outcomes[0].mutation.target(), mine);
        assert_eq!(store.primary_owner(&mine).as_deref(), Some("carol@example.com"));
        assert_eq!(store.primary_owner(&foreign).as_deref(), Some("bob@example.com"));
    }

    #[tokio::test]
    async fn test_only_caller_owned_files_are_queued() {
        let store = MemoryStore::new("me@example.com");
        let folder = store.add_folder(ROOT_ID, "mine");
        store.add_file(&folder, "a");
        store.add_file_owned_by(&folder, "b", "bob@example.com");
        store.add_unowned_file(&folder, "c");
        store.add_file(ROOT_ID, "d");

        let report = transfer_ownership(&store, ROOT_ID, "carol@example.com", TransferOptions::default())
            .await
            .unwrap();

        assert_eq!(report.mutations.succeeded, 2);
        assert_eq!(report.skipped, 2);
        assert!(
            report
                .mutations
                .outcomes
                .iter()
                .all(|o| o.mutation.target() != folder)
        );
    }

    #[tokio::test]
    async fn test_page_one_flushed_when_page_two_fails() {
        let store = MemoryStore::new("me@example.com").with_page_size(2);
        let files: Vec<_> = (0..6)
            .map(|i| store.add_file(ROOT_ID, &format!("f{i}")))
            .collect();
        store.fail_listing(ROOT_ID, 1);

        let report = transfer_ownership(&store, ROOT_ID, "carol@example.com", TransferOptions::default())
            .await
            .unwrap();

        assert_eq!(store.batch_sizes(), vec![2]);
        assert_eq!(store.primary_owner(&files[0]).as_deref(), Some("carol@example.com"));
        assert_eq!(store.primary_owner(&files[2]).as_deref(), Some("me@example.com"));
        assert_eq!(report.walk.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_owner() {
        let store = MemoryStore::new("me@example.com");
        for owner in ["", "   ", "carol"] {
            let result = transfer_ownership(&store, ROOT_ID, owner, TransferOptions::default()).await;
            assert!(matches!(result, Err(DriveError::InvalidArgument(_))));
        }
        assert!(store.batch_sizes().is_empty());
    }
}

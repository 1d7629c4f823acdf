//! Moving a folder tree's contents into a destination folder.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use super::announce_folder;
use crate::error::{DriveError, Result};
use crate::fs::mutation::Mutation;
use crate::fs::node::Node;
use crate::fs::operations::batch::{BatchMutator, MAX_BATCH_SIZE, MutationSummary};
use crate::fs::operations::cleanup::{CleanupReport, remove_empty_folders};
use crate::fs::operations::walk::{TreeWalker, Visitor, WalkReport};
use crate::fs::store::RemoteStore;
use crate::progress::OutcomeCallback;

/// Settings for [`move_tree`].
pub struct MoveOptions {
    /// Mutations per batch, clamped to `1..=MAX_BATCH_SIZE`
    pub batch_size: usize,
    /// Called for every mutation outcome
    pub on_outcome: Option<OutcomeCallback>,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            on_outcome: None,
        }
    }
}

/// Result of a move run.
#[derive(Debug)]
pub struct MoveReport {
    /// Traversal of the source tree
    pub walk: WalkReport,
    /// File move outcomes
    pub mutations: MutationSummary,
    /// Source folders removed afterwards
    pub cleanup: CleanupReport,
    /// Destination folders that had to be created
    pub created_folders: usize,
}

struct MoveVisitor<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    mutator: BatchMutator<'a, S>,
    // Destination folder for the source folder currently being walked.
    destinations: Vec<String>,
    destination_ids: HashSet<String>,
    created_folders: usize,
}

impl<S: RemoteStore + ?Sized> MoveVisitor<'_, S> {
    fn current_destination(&self) -> &str {
        self.destinations
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    async fn destination_for(&mut self, name: &str) -> Result<String> {
        let parent = self.current_destination().to_string();
        if let Some(existing) = self.store.find_child_folder(&parent, name).await? {
            debug!(name, folder = %existing.id, "reusing destination folder");
            return Ok(existing.id);
        }
        let created = self.store.create_folder(&parent, name).await?;
        debug!(name, folder = %created.id, "created destination folder");
        self.created_folders += 1;
        Ok(created.id)
    }
}

#[async_trait]
impl<'a, S: RemoteStore + ?Sized> Visitor for MoveVisitor<'a, S> {
    async fn visit_file(&mut self, node: &Node) {
        let mutation = Mutation::AddParent {
            file_id: node.id.clone(),
            parent_id: self.current_destination().to_string(),
        };
        self.mutator.add(mutation).await;
    }

    async fn enter_folder(&mut self, node: &Node) -> Result<bool> {
        if self.destination_ids.contains(&node.id) {
            debug!(folder = %node.id, "destination lies inside source, not descending");
            return Ok(false);
        }
        announce_folder(&node.name);

        let destination = self.destination_for(&node.name).await?;
        self.destination_ids.insert(destination.clone());
        self.destinations.push(destination);
        Ok(true)
    }

    async fn leave_folder(&mut self, _node: &Node) {
        self.destinations.pop();
    }
}

/// Move every file below `source_id` into `destination_id`.
///
/// Sub-folders are recreated (or reused, when a folder with the same name
/// already exists) under the destination. After the final batch is flushed,
/// every source folder left without children is deleted.
pub async fn move_tree<S: RemoteStore + ?Sized>(
    store: &S,
    source_id: &str,
    destination_id: &str,
    options: MoveOptions,
) -> Result<MoveReport> {
    if source_id == destination_id {
        return Err(DriveError::InvalidArgument(
            "source and destination are the same folder".to_string(),
        ));
    }

    super::announce_root(store, source_id).await;

    let mut mutator = BatchMutator::with_capacity(store, options.batch_size);
    if let Some(callback) = options.on_outcome {
        mutator = mutator.on_outcome(callback);
    }

    let mut visitor = MoveVisitor {
        store,
        mutator,
        destinations: vec![destination_id.to_string()],
        destination_ids: HashSet::from([destination_id.to_string()]),
        created_folders: 0,
    };
    let walk = TreeWalker::new(store).walk(source_id, &mut visitor).await;
    let mutations = visitor.mutator.finish().await;

    // Moves are committed now, so emptiness checks are accurate.
    let cleanup = remove_empty_folders(store, &walk.visited_folders).await;

    Ok(MoveReport {
        walk,
        mutations,
        cleanup,
        created_folders: visitor.created_folders,
    })
}

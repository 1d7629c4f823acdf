//! Bounded batching of mutation requests.

use tracing::{debug, info, warn};

use crate::error::DriveError;
use crate::fs::mutation::{Mutation, MutationOutcome};
use crate::fs::store::RemoteStore;
use crate::progress::{MutationProgress, OutcomeCallback};

/// Largest number of calls the Drive batch endpoint accepts per request.
pub const MAX_BATCH_SIZE: usize = 100;

/// Mutations collected for a single submission.
#[derive(Debug)]
struct Batch {
    items: Vec<Mutation>,
}

impl Batch {
    fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Totals after all batches were submitted.
#[derive(Debug, Default)]
pub struct MutationSummary {
    /// Number of batch submissions
    pub batches: usize,
    /// Items that succeeded
    pub succeeded: usize,
    /// Items that failed
    pub failed: usize,
    /// Per-item outcomes not yet taken by the caller
    pub outcomes: Vec<MutationOutcome>,
}

/// Accumulates mutations and submits them in batches of at most `capacity`.
///
/// A batch is opened by the first [`add`](Self::add) after a submission and
/// sent as soon as it is full. The last, partial batch is only sent by
/// [`flush`](Self::flush), which callers must invoke once they are done.
pub struct BatchMutator<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    capacity: usize,
    batch: Option<Batch>,
    batches_submitted: usize,
    progress: MutationProgress,
    outcomes: Vec<MutationOutcome>,
    on_outcome: Option<OutcomeCallback>,
}

impl<'a, S: RemoteStore + ?Sized> BatchMutator<'a, S> {
    /// Create a mutator using [`MAX_BATCH_SIZE`].
    pub fn new(store: &'a S) -> Self {
        Self::with_capacity(store, MAX_BATCH_SIZE)
    }

    /// Create a mutator with a smaller batch size, clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_capacity(store: &'a S, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.clamp(1, MAX_BATCH_SIZE),
            batch: None,
            batches_submitted: 0,
            progress: MutationProgress::default(),
            outcomes: Vec::new(),
            on_outcome: None,
        }
    }

    /// Invoke `callback` for every outcome as it arrives.
    pub fn on_outcome(mut self, callback: OutcomeCallback) -> Self {
        self.on_outcome = Some(callback);
        self
    }

    /// Effective batch size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued, unsubmitted mutations.
    pub fn pending(&self) -> usize {
        self.batch.as_ref().map_or(0, Batch::len)
    }

    /// Number of batches submitted so far.
    pub fn batches_submitted(&self) -> usize {
        self.batches_submitted
    }

    /// Outcome tally so far.
    pub fn progress(&self) -> MutationProgress {
        self.progress
    }

    /// Queue a mutation, submitting the batch when it reaches capacity.
    pub async fn add(&mut self, mutation: Mutation) {
        let capacity = self.capacity;
        let batch = self.batch.get_or_insert_with(|| Batch::new(capacity));
        batch.items.push(mutation);

        if batch.len() >= capacity {
            info!(size = capacity, "maximum batch size reached, executing batch");
            self.flush().await;
        }
    }

    /// Submit the queued mutations, if any.
    pub async fn flush(&mut self) {
        let Some(batch) = self.batch.take() else {
            return;
        };
        if batch.items.is_empty() {
            return;
        }

        let size = batch.len();
        debug!(size, "submitting batch");
        let results = self.store.submit_batch(&batch.items).await;
        self.batches_submitted += 1;

        match results {
            Ok(results) => {
                let mut results = results.into_iter();
                for mutation in batch.items {
                    let result = results.next().unwrap_or(Err(DriveError::InvalidResponse));
                    self.record(MutationOutcome { mutation, result });
                }
            }
            Err(error) => {
                warn!(size, %error, "batch submission failed");
                let message = error.to_string();
                for mutation in batch.items {
                    self.record(MutationOutcome {
                        mutation,
                        result: Err(DriveError::BatchRejected(message.clone())),
                    });
                }
            }
        }
        info!(
            size,
            succeeded = self.progress.succeeded,
            failed = self.progress.failed,
            "batch execution finished"
        );
    }

    fn record(&mut self, outcome: MutationOutcome) {
        self.progress.record(&outcome);
        if let Some(callback) = self.on_outcome.as_mut() {
            callback(&outcome);
        }
        self.outcomes.push(outcome);
    }

    /// Take the outcomes collected so far.
    pub fn take_outcomes(&mut self) -> Vec<MutationOutcome> {
        std::mem::take(&mut self.outcomes)
    }

    /// Flush the remaining mutations and return the totals.
    pub async fn finish(mut self) -> MutationSummary {
        self.flush().await;
        MutationSummary {
            batches: self.batches_submitted,
            succeeded: self.progress.succeeded,
            failed: self.progress.failed,
            outcomes: std::mem::take(&mut self.outcomes),
        }
    }
}

impl<S: RemoteStore + ?Sized> Drop for BatchMutator<'_, S> {
    fn drop(&mut self) {
        let pending = self.pending();
        if pending > 0 {
            warn!(pending, "batch mutator dropped with unsubmitted mutations");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryStore, ROOT_ID};
    use std::sync::{Arc, Mutex};

    fn move_to(file_id: &str, parent_id: &str) -> Mutation {
        Mutation::AddParent {
            file_id: file_id.to_string(),
            parent_id: parent_id.to_string(),
        }
    }

    fn store_with_files(n: usize) -> (MemoryStore, Vec<String>, String) {
        let store = MemoryStore::new("me@example.com");
        let dest = store.add_folder(ROOT_ID, "dest");
        let files = (0..n)
            .map(|i| store.add_file(ROOT_ID, &format!("f{i}")))
            .collect();
        (store, files, dest)
    }

    #[tokio::test]
    async fn test_batch_count_is_ceiling() {
        for n in [1usize, 99, 100, 101, 250] {
            let (store, files, dest) = store_with_files(n);
            let mut mutator = BatchMutator::new(&store);
            for file in &files {
                mutator.add(move_to(file, &dest)).await;
            }
            let summary = mutator.finish().await;

            let expected = n.div_ceil(MAX_BATCH_SIZE);
            assert_eq!(summary.batches, expected, "n = {n}");
            assert_eq!(store.batch_sizes().len(), expected);
            assert!(store.batch_sizes().iter().all(|&s| s <= MAX_BATCH_SIZE));
            assert_eq!(store.batch_sizes().iter().sum::<usize>(), n);
            assert_eq!(summary.succeeded, n);
            assert_eq!(summary.outcomes.len(), n);
        }
    }

    #[tokio::test]
    async fn test_auto_flush_when_full() {
        let (store, files, dest) = store_with_files(5);
        let mut mutator = BatchMutator::with_capacity(&store, 2);

        mutator.add(move_to(&files[0], &dest)).await;
        assert_eq!(mutator.pending(), 1);
        assert!(store.batch_sizes().is_empty());

        mutator.add(move_to(&files[1], &dest)).await;
        assert_eq!(mutator.pending(), 0);
        assert_eq!(store.batch_sizes(), vec![2]);

        mutator.add(move_to(&files[2], &dest)).await;
        mutator.flush().await;
        assert_eq!(store.batch_sizes(), vec![2, 1]);
        assert_eq!(mutator.batches_submitted(), 2);
    }

    #[tokio::test]
    async fn test_flush_on_empty_is_noop() {
        let (store, _, _) = store_with_files(0);
        let mut mutator = BatchMutator::new(&store);
        mutator.flush().await;
        mutator.flush().await;
        assert_eq!(mutator.batches_submitted(), 0);
        assert!(store.batch_sizes().is_empty());
    }

    #[test]
    fn test_capacity_is_clamped() {
        let store = MemoryStore::new("me@example.com");
        assert_eq!(BatchMutator::with_capacity(&store, 0).capacity(), 1);
        assert_eq!(BatchMutator::with_capacity(&store, 500).capacity(), MAX_BATCH_SIZE);
        assert_eq!(BatchMutator::with_capacity(&store, 10).capacity(), 10);
    }

    #[tokio::test]
    async fn test_item_failure_does_not_fail_siblings() {
        let (store, files, dest) = store_with_files(3);
        store.fail_mutation(&files[1]);

        let mut mutator = BatchMutator::new(&store);
        for file in &files {
            mutator.add(move_to(file, &dest)).await;
        }
        let summary = mutator.finish().await;

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.outcomes[1].is_success());
        assert_eq!(summary.outcomes[1].mutation.target(), files[1]);
        assert_eq!(store.parent_of(&files[0]).as_deref(), Some(dest.as_str()));
        assert_eq!(store.parent_of(&files[1]).as_deref(), Some(ROOT_ID));
    }

    #[tokio::test]
    async fn test_rejected_batch_fails_each_item() {
        let (store, files, dest) = store_with_files(2);
        store.reject_batches(true);

        let mut mutator = BatchMutator::new(&store);
        for file in &files {
            mutator.add(move_to(file, &dest)).await;
        }
        let summary = mutator.finish().await;

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.failed, 2);
        assert!(
            summary
                .outcomes
                .iter()
                .all(|o| matches!(o.result, Err(DriveError::BatchRejected(_))))
        );
    }

    #[tokio::test]
    async fn test_outcome_callback_sees_every_item() {
        let (store, files, dest) = store_with_files(3);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut mutator = BatchMutator::with_capacity(&store, 2).on_outcome(Box::new(
            move |outcome: &MutationOutcome| {
                sink.lock().unwrap().push(outcome.mutation.target().to_string());
            },
        ));
        for file in &files {
            mutator.add(move_to(file, &dest)).await;
        }
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(mutator.take_outcomes().len(), 2);

        let summary = mutator.finish().await;
        assert_eq!(*seen.lock().unwrap(), files);
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.succeeded, 3);
    }
}

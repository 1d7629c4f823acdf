//! # drivetools
//!
//! Recursive maintenance operations for Google Drive folder trees.
//!
//! ## Features
//!
//! - **Traversal**: depth-first, page-by-page walk of a folder tree
//!   ([`TreeWalker`]) with a pluggable [`Visitor`].
//! - **Batching**: mutations are coalesced into batch requests of at most
//!   [`MAX_BATCH_SIZE`] calls ([`BatchMutator`]), with per-item outcomes.
//! - **Operations**:
//!   - Count files per owner ([`count_owners`]).
//!   - Move a tree's files into another folder, recreating sub-folders and
//!     deleting emptied source folders ([`move_tree`]).
//!   - Transfer ownership of every caller-owned file ([`transfer_ownership`]).
//! - **Retries**: transient API failures are retried with exponential backoff.
//!
//! Every operation talks to storage through the [`RemoteStore`] trait;
//! [`DriveClient`] implements it over the Drive v3 REST API.
//!
//! ## Example
//!
//! ```no_run
//! use drivetools::{DriveClient, count_owners};
//!
//! # async fn example() -> drivetools::Result<()> {
//! let client = DriveClient::new("ya29.access-token");
//! let counts = count_owners(&client, "root").await;
//! for (owner, files) in &counts.by_owner {
//!     println!("{owner}: {files}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod fs;
pub mod http;
pub mod progress;

// Re-export commonly used types
pub use api::{ClientConfig, DriveClient};
pub use error::{DriveError, Result};
pub use fs::operations::{
    BatchMutator, CleanupReport, MAX_BATCH_SIZE, MoveOptions, MoveReport, MutationSummary,
    OwnerCounts, TransferOptions, TransferReport, TreeWalker, Visitor, WalkError, WalkReport,
    count_owners, move_tree, remove_empty_folders, transfer_ownership,
};
pub use fs::{Mutation, MutationOutcome, Node, NodeKind, Owner, Page, RemoteStore};
pub use progress::{MutationProgress, OutcomeCallback};

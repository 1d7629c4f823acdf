//! Tree operations built on the walker and the batch mutator.

mod batch;
mod cleanup;
mod count;
mod relocate;
mod transfer;
mod walk;

use tracing::{info, warn};

use crate::fs::store::RemoteStore;

pub use batch::{BatchMutator, MAX_BATCH_SIZE, MutationSummary};
pub use cleanup::{CleanupReport, remove_empty_folders};
pub use count::{OwnerCounts, count_owners};
pub use relocate::{MoveOptions, MoveReport, move_tree};
pub use transfer::{TransferOptions, TransferReport, transfer_ownership};
pub use walk::{TreeWalker, Visitor, WalkError, WalkReport};

fn announce_folder(name: &str) {
    info!("Gathering files in folder '{}'", name);
}

/// Log the name of the folder a run starts from.
async fn announce_root<S: RemoteStore + ?Sized>(store: &S, folder_id: &str) {
    match store.folder_name(folder_id).await {
        Ok(name) => announce_folder(&name),
        Err(error) => warn!(folder = folder_id, %error, "cannot resolve folder name"),
    }
}

//! Moves all files of a Google Drive folder tree into a destination folder,
//! recreating its sub-folders and deleting the emptied source folders.
//!
//! Usage:
//!   drive-move --token TOKEN --destination ID [--folder ID] [--batch-size N]

mod cli;

use clap::Parser;
use cli::{BatchArgs, CommonArgs, init_tracing};
use drivetools::progress::make_progress_printer;
use drivetools::{MoveOptions, move_tree};

#[derive(Parser, Debug)]
#[command(name = "drive-move", version)]
#[command(about = "Move all files and folders of a Google Drive folder recursively")]
struct Args {
    /// ID of the destination folder where the files should be moved to
    #[arg(short, long)]
    destination: String,

    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    batch: BatchArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    let args = Args::parse();
    let client = args.common.client();

    println!("Moving all files to '{}'", args.destination);
    let options = MoveOptions {
        batch_size: args.batch.batch_size,
        on_outcome: Some(make_progress_printer()),
    };

    let report = match move_tree(&client, &args.common.folder, &args.destination, options).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Move failed: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    for failure in &report.walk.errors {
        eprintln!("An error occurred in folder '{}': {}", failure.folder_id, failure.error);
    }
    for failure in &report.cleanup.errors {
        eprintln!("[x] Deleting folder '{}' failed: {}", failure.folder_id, failure.error);
    }
    println!(
        "Moved {} files ({} failed) in {} batches, created {} folders, deleted {} empty folders.",
        report.mutations.succeeded,
        report.mutations.failed,
        report.mutations.batches,
        report.created_folders,
        report.cleanup.deleted.len()
    );
}

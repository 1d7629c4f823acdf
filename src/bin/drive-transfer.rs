//! Transfers ownership of all files in a Google Drive folder tree that the
//! caller owns to a new owner.
//!
//! Usage:
//!   drive-transfer --token TOKEN --owner EMAIL [--folder ID] [--batch-size N]

mod cli;

use clap::Parser;
use cli::{BatchArgs, CommonArgs, init_tracing};
use drivetools::progress::make_progress_printer;
use drivetools::{TransferOptions, transfer_ownership};

#[derive(Parser, Debug)]
#[command(name = "drive-transfer", version)]
#[command(about = "Transfer ownership of all files of a Google Drive folder recursively")]
struct Args {
    /// E-mail address of the new owner
    #[arg(short, long)]
    owner: String,

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

    println!("Changing all files to owner '{}'", args.owner);
    let options = TransferOptions {
        batch_size: args.batch.batch_size,
        on_outcome: Some(make_progress_printer()),
    };

    let report = match transfer_ownership(&client, &args.common.folder, &args.owner, options).await
    {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Transfer failed: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    for failure in &report.walk.errors {
        eprintln!("An error occurred in folder '{}': {}", failure.folder_id, failure.error);
    }
    println!(
        "Transferred {} files ({} failed) in {} batches, skipped {} files not owned by you.",
        report.mutations.succeeded,
        report.mutations.failed,
        report.mutations.batches,
        report.skipped
    );
}

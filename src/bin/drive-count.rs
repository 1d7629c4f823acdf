//! Counts the number of files owned by different users in a Google Drive
//! folder and all its subfolders.
//!
//! Usage:
//!   drive-count --token TOKEN [--folder ID]

mod cli;

use clap::Parser;
use cli::{CommonArgs, init_tracing};
use drivetools::count_owners;

#[derive(Parser, Debug)]
#[command(name = "drive-count", version)]
#[command(about = "Count files per owner in a Google Drive folder and all its subfolders")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    let args = Args::parse();
    let client = args.common.client();

    println!("Counting...");
    let counts = count_owners(&client, &args.common.folder).await;

    for failure in &counts.walk.errors {
        eprintln!("An error occurred in folder '{}': {}", failure.folder_id, failure.error);
    }
    match serde_json::to_string_pretty(&counts) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to encode counts: {}", e);
            std::process::exit(1);
        }
    }
    if counts.unowned > 0 {
        println!("{} files without owner", counts.unowned);
    }
}

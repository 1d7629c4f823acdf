//! Shared command-line plumbing for the drive tools.

use std::process;

use clap::Args;
use drivetools::{ClientConfig, DriveClient, MAX_BATCH_SIZE};
use tracing_subscriber::{EnvFilter, fmt};

/// Options every tool accepts.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// ID of the Google Drive folder. The user's root directory is used if left empty.
    #[arg(short, long, default_value = "root")]
    pub folder: String,

    /// OAuth2 access token with the drive scope
    #[arg(long, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true)]
    pub token: String,

    /// HTTP or SOCKS proxy URL
    #[arg(long, env = "DRIVE_PROXY")]
    pub proxy: Option<String>,
}

/// Options of the tools that submit batches.
#[allow(dead_code)] // drive-count only needs CommonArgs.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Requests per batch (at most 100)
    #[arg(long, default_value_t = MAX_BATCH_SIZE)]
    pub batch_size: usize,
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("drivetools=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

impl CommonArgs {
    pub fn client(&self) -> DriveClient {
        let config = ClientConfig {
            proxy: self.proxy.clone(),
            ..ClientConfig::default()
        };
        DriveClient::with_config(&self.token, config).unwrap_or_else(|e| {
            eprintln!("Failed to create client: {}", e);
            process::exit(1);
        })
    }
}

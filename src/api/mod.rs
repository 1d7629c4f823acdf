//! Google Drive API client and types.

pub mod batch;
pub mod client;
pub mod error;

pub use client::{ClientConfig, DriveClient};
pub use error::ApiErrorReason;

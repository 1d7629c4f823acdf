//! The remote storage seam used by every filesystem operation.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::fs::mutation::Mutation;
use crate::fs::node::{Node, Page};

/// Remote hierarchical storage reachable over the network.
///
/// Implemented by [`crate::api::DriveClient`] for the real service and by
/// `MemoryStore` (tests and the `mock` feature).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List one page of non-trashed children of `folder_id`.
    async fn list_children(&self, folder_id: &str, page_token: Option<&str>) -> Result<Page>;

    /// Resolve an item's display name.
    async fn folder_name(&self, id: &str) -> Result<String>;

    /// Find a non-trashed folder called `name` directly under `parent_id`.
    ///
    /// Returns `Ok(None)` when no such folder exists.
    async fn find_child_folder(&self, parent_id: &str, name: &str) -> Result<Option<Node>>;

    /// Create a folder called `name` under `parent_id`.
    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<Node>;

    /// Delete an item.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Submit mutations as one request.
    ///
    /// The outer `Result` is the transport outcome; the inner results are
    /// per-item, in submission order.
    async fn submit_batch(&self, mutations: &[Mutation]) -> Result<Vec<Result<Value>>>;
}

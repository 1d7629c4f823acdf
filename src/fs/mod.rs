//! Remote filesystem model and operations.

#[cfg(any(test, feature = "mock"))]
mod memory;
pub(crate) mod mutation;
pub(crate) mod node;
pub mod operations;
mod store;

#[cfg(any(test, feature = "mock"))]
pub use memory::{MemoryStore, ROOT_ID};
pub use mutation::{Mutation, MutationOutcome};
pub use node::{FOLDER_MIME_TYPE, Node, NodeKind, Owner, Page};
pub use store::RemoteStore;

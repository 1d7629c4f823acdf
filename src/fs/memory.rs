//! In-memory remote store for testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{DriveError, Result};
use crate::fs::mutation::Mutation;
use crate::fs::node::{Node, Owner, Page};
use crate::fs::store::RemoteStore;

/// Id of the folder every `MemoryStore` starts with.
pub const ROOT_ID: &str = "root";

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    // Oldest first.
    parents: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<Entry>,
    next_id: u64,
    // Listing snapshots so page tokens behave like server-side cursors.
    listings: HashMap<u64, Vec<Node>>,
    next_listing: u64,
    list_failures: HashSet<(String, usize)>,
    failing_items: HashSet<String>,
    failing_deletes: HashSet<String>,
    reject_batches: bool,
    batch_sizes: Vec<usize>,
    deleted: Vec<String>,
    list_calls: usize,
    additive_parents: bool,
}

impl State {
    fn find(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.node.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.node.id == id)
    }

    fn children(&self, parent_id: &str) -> Vec<Node> {
        self.entries
            .iter()
            .filter(|e| e.parents.iter().any(|p| p == parent_id))
            .map(|e| e.node.clone())
            .collect()
    }

    fn insert(&mut self, parent: &str, node: Node) {
        self.entries.push(Entry {
            node,
            parents: vec![parent.to_string()],
        });
    }

    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("id{}", self.next_id)
    }

    fn remove_tree(&mut self, id: &str) {
        for child in self.children(id) {
            self.remove_tree(&child.id);
        }
        self.entries.retain(|e| e.node.id != id);
    }
}

/// In-memory [`RemoteStore`] with fault injection.
///
/// Items are kept in insertion order. By default every item has exactly one
/// parent and adding a parent moves the item. [`DriveClient`] only sends
/// `addParents`, never `removeParents`; [`with_additive_parents`] models a
/// server that keeps the previous parents, where a moved file stays listed in
/// its source folder and that folder is never left empty.
/// Listings are snapshotted when their first page is requested, so later
/// pages are unaffected by concurrent mutations.
///
/// [`DriveClient`]: crate::api::DriveClient
///
/// [`with_additive_parents`]: MemoryStore::with_additive_parents
///
/// # Example
///
/// ```
/// use drivetools::fs::{MemoryStore, ROOT_ID};
///
/// let store = MemoryStore::new("me@example.com").with_page_size(2);
/// let docs = store.add_folder(ROOT_ID, "Docs");
/// store.add_file(&docs, "a.txt");
/// assert_eq!(store.children(&docs).len(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    me: String,
    page_size: usize,
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create a store with an empty root folder owned by `me`.
    pub fn new(me: impl Into<String>) -> Self {
        let me = me.into();
        let root = Node::folder(ROOT_ID, "My Drive", vec![Owner::new(me.clone(), true)]);
        let state = State {
            entries: vec![Entry {
                node: root,
                parents: Vec::new(),
            }],
            ..State::default()
        };
        Self {
            me,
            page_size: DEFAULT_PAGE_SIZE,
            state: Mutex::new(state),
        }
    }

    /// Set how many children a listing page holds.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Keep existing parents when a parent is added.
    pub fn with_additive_parents(self) -> Self {
        self.state().additive_parents = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn owner(&self, email: &str) -> Owner {
        Owner::new(email, email == self.me)
    }

    /// Add a folder owned by the caller.
    pub fn add_folder(&self, parent: &str, name: &str) -> String {
        let me = self.me.clone();
        self.add_folder_owned_by(parent, name, &me)
    }

    /// Add a folder owned by `owner`.
    pub fn add_folder_owned_by(&self, parent: &str, name: &str, owner: &str) -> String {
        let owner = self.owner(owner);
        let mut state = self.state();
        let id = state.fresh_id();
        state.insert(parent, Node::folder(id.clone(), name, vec![owner]));
        id
    }

    /// Add a file owned by the caller.
    pub fn add_file(&self, parent: &str, name: &str) -> String {
        let me = self.me.clone();
        self.add_file_owned_by(parent, name, &me)
    }

    /// Add a file owned by `owner`.
    pub fn add_file_owned_by(&self, parent: &str, name: &str, owner: &str) -> String {
        let owner = self.owner(owner);
        let mut state = self.state();
        let id = state.fresh_id();
        state.insert(parent, Node::file(id.clone(), name, vec![owner]));
        id
    }

    /// Add a file without any owner (e.g. shared-drive content).
    pub fn add_unowned_file(&self, parent: &str, name: &str) -> String {
        let mut state = self.state();
        let id = state.fresh_id();
        state.insert(parent, Node::file(id.clone(), name, Vec::new()));
        id
    }

    /// Make the listing of `folder_id` fail on page `page_index` (0-based).
    pub fn fail_listing(&self, folder_id: &str, page_index: usize) {
        self.state()
            .list_failures
            .insert((folder_id.to_string(), page_index));
    }

    /// Make every mutation targeting `item_id` fail.
    pub fn fail_mutation(&self, item_id: &str) {
        self.state().failing_items.insert(item_id.to_string());
    }

    /// Make deleting `item_id` fail.
    pub fn fail_delete(&self, item_id: &str) {
        self.state().failing_deletes.insert(item_id.to_string());
    }

    /// Reject whole batch submissions at the transport level.
    pub fn reject_batches(&self, reject: bool) {
        self.state().reject_batches = reject;
    }

    /// Sizes of all submitted batches, in order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state().batch_sizes.clone()
    }

    /// Ids removed through [`RemoteStore::delete`], in order.
    pub fn deleted(&self) -> Vec<String> {
        self.state().deleted.clone()
    }

    /// Number of `list_children` calls served.
    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    /// Current children of `folder_id`.
    pub fn children(&self, folder_id: &str) -> Vec<Node> {
        self.state().children(folder_id)
    }

    /// Most recently added parent of `id`.
    pub fn parent_of(&self, id: &str) -> Option<String> {
        self.state().find(id).and_then(|e| e.parents.last().cloned())
    }

    /// All parents of `id`, oldest first.
    pub fn parents_of(&self, id: &str) -> Vec<String> {
        self.state()
            .find(id)
            .map(|e| e.parents.clone())
            .unwrap_or_default()
    }

    /// Check if `id` still exists.
    pub fn exists(&self, id: &str) -> bool {
        self.state().find(id).is_some()
    }

    /// Primary owner e-mail of `id`.
    pub fn primary_owner(&self, id: &str) -> Option<String> {
        self.state()
            .find(id)
            .and_then(|e| e.node.primary_owner().map(|o| o.email_address.clone()))
    }

    fn apply(&self, state: &mut State, mutation: &Mutation) -> Result<Value> {
        let target = mutation.target();
        if state.failing_items.contains(target) {
            return Err(DriveError::Api {
                code: 403,
                reason: "insufficientPermissions".to_string(),
                message: format!("Cannot modify {}", target),
            });
        }

        match mutation {
            Mutation::AddParent { file_id, parent_id } => {
                if state.find(parent_id).is_none() {
                    return Err(DriveError::NotFound(parent_id.clone()));
                }
                let additive = state.additive_parents;
                let entry = state
                    .find_mut(file_id)
                    .ok_or_else(|| DriveError::NotFound(file_id.clone()))?;
                if !additive {
                    entry.parents.clear();
                }
                if !entry.parents.contains(parent_id) {
                    entry.parents.push(parent_id.clone());
                }
                Ok(json!({ "id": file_id, "parents": entry.parents }))
            }
            Mutation::TransferOwnership { file_id, new_owner } => {
                let owner = self.owner(new_owner);
                let entry = state
                    .find_mut(file_id)
                    .ok_or_else(|| DriveError::NotFound(file_id.clone()))?;
                entry.node.owners = vec![owner];
                Ok(json!({ "kind": "drive#permission", "role": "owner", "emailAddress": new_owner }))
            }
        }
    }
}

fn parse_token(token: &str) -> Option<(u64, usize)> {
    let (listing, offset) = token.split_once(':')?;
    Some((listing.parse().ok()?, offset.parse().ok()?))
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_children(&self, folder_id: &str, page_token: Option<&str>) -> Result<Page> {
        let mut state = self.state();
        state.list_calls += 1;

        let (listing, offset) = match page_token {
            Some(token) => parse_token(token).ok_or(DriveError::InvalidResponse)?,
            None => {
                if state.find(folder_id).is_none() {
                    return Err(DriveError::NotFound(folder_id.to_string()));
                }
                let snapshot = state.children(folder_id);
                state.next_listing += 1;
                let listing = state.next_listing;
                state.listings.insert(listing, snapshot);
                (listing, 0)
            }
        };

        let page_index = offset / self.page_size;
        if state
            .list_failures
            .contains(&(folder_id.to_string(), page_index))
        {
            return Err(DriveError::Api {
                code: 500,
                reason: "backendError".to_string(),
                message: format!("Listing {} failed on page {}", folder_id, page_index),
            });
        }

        let snapshot = state
            .listings
            .get(&listing)
            .ok_or(DriveError::InvalidResponse)?;
        let end = (offset + self.page_size).min(snapshot.len());
        let nodes = snapshot[offset.min(end)..end].to_vec();
        let next_page_token = (end < snapshot.len()).then(|| format!("{}:{}", listing, end));

        Ok(Page {
            nodes,
            next_page_token,
        })
    }

    async fn folder_name(&self, id: &str) -> Result<String> {
        self.state()
            .find(id)
            .map(|e| e.node.name.clone())
            .ok_or_else(|| DriveError::NotFound(id.to_string()))
    }

    async fn find_child_folder(&self, parent_id: &str, name: &str) -> Result<Option<Node>> {
        Ok(self
            .state()
            .children(parent_id)
            .into_iter()
            .find(|n| n.is_folder() && n.name == name))
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<Node> {
        let owner = self.owner(&self.me);
        let mut state = self.state();
        if state.find(parent_id).is_none() {
            return Err(DriveError::NotFound(parent_id.to_string()));
        }
        let id = state.fresh_id();
        let node = Node::folder(id, name, vec![owner]);
        state.insert(parent_id, node.clone());
        Ok(node)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        if state.failing_deletes.contains(id) {
            return Err(DriveError::Api {
                code: 403,
                reason: "insufficientPermissions".to_string(),
                message: format!("Cannot delete {}", id),
            });
        }
        if state.find(id).is_none() {
            return Err(DriveError::NotFound(id.to_string()));
        }
        state.remove_tree(id);
        state.deleted.push(id.to_string());
        Ok(())
    }

    async fn submit_batch(&self, mutations: &[Mutation]) -> Result<Vec<Result<Value>>> {
        let mut state = self.state();
        if state.reject_batches {
            return Err(DriveError::HttpError(503));
        }
        state.batch_sizes.push(mutations.len());
        Ok(mutations
            .iter()
            .map(|m| self.apply(&mut state, m))
            .collect())
    }
}

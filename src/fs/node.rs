//! Remote item types.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses to mark folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file (any non-folder MIME type)
    File,
    /// Folder
    Folder,
}

impl NodeKind {
    /// Classify a Drive MIME type.
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            NodeKind::Folder
        } else {
            NodeKind::File
        }
    }
}

/// An owner of a remote item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Owner e-mail address
    #[serde(default)]
    pub email_address: String,
    /// Display name, when the provider returns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Whether the owner is the authenticated caller
    #[serde(default)]
    pub me: bool,
}

impl Owner {
    /// Create an owner entry.
    pub fn new(email_address: impl Into<String>, me: bool) -> Self {
        Self {
            email_address: email_address.into(),
            display_name: None,
            me,
        }
    }
}

/// A remote file or folder as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawNode")]
pub struct Node {
    /// Item id
    pub id: String,
    /// Display name
    pub name: String,
    /// File or folder
    pub kind: NodeKind,
    /// Owners, primary owner first
    pub owners: Vec<Owner>,
}

impl Node {
    /// Create a file node.
    pub fn file(id: impl Into<String>, name: impl Into<String>, owners: Vec<Owner>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::File,
            owners,
        }
    }

    /// Create a folder node.
    pub fn folder(id: impl Into<String>, name: impl Into<String>, owners: Vec<Owner>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Folder,
            owners,
        }
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Check if this node is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// First listed owner.
    pub fn primary_owner(&self) -> Option<&Owner> {
        self.owners.first()
    }

    /// Whether the authenticated caller is the primary owner.
    pub fn owned_by_me(&self) -> bool {
        self.primary_owner().is_some_and(|o| o.me)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    owners: Vec<Owner>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        Self {
            kind: NodeKind::from_mime_type(&raw.mime_type),
            id: raw.id,
            name: raw.name,
            owners: raw.owners,
        }
    }
}

/// One page of a children listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Items on this page
    #[serde(default, rename = "files")]
    pub nodes: Vec<Node>,
    /// Continuation token; absent on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl Page {
    /// Check if another page follows.
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

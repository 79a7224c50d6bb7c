//! The document tree highlights are uploaded into.
//!
//! [`RemoteTree`] is the only thing the uploader knows about the note
//! service: list a node's children, create a child, move a node.

pub mod notion;

#[cfg(test)]
pub mod memory;

use crate::models::{BlockType, Color};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A child as seen from its parent. Dividers, images and the like have no title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNode {
    pub id: NodeId,
    pub title: Option<String>,
}

impl RemoteNode {
    pub fn has_title(&self, title: &str) -> bool {
        self.title.as_deref() == Some(title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Styled(BlockType),
    Divider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBlock<'a> {
    pub kind: BlockKind,
    pub title: Option<&'a str>,
    pub color: Color,
}

impl<'a> NewBlock<'a> {
    pub fn styled(block_type: BlockType, title: &'a str, color: Color) -> Self {
        NewBlock {
            kind: BlockKind::Styled(block_type),
            title: Some(title),
            color,
        }
    }

    pub fn divider() -> Self {
        NewBlock {
            kind: BlockKind::Divider,
            title: None,
            color: Color::Default,
        }
    }
}

/// Where a moved node ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    LastChildOf(&'a NodeId),
    After(&'a NodeId),
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("No notion.v2token configured")]
    MissingToken,
    #[error("Invalid page reference: '{0}'")]
    InvalidPage(String),
    #[error("No section titled '{0}' on the page")]
    SectionMissing(String),
    #[error("Block not found or not accessible: {0}")]
    NotFound(NodeId),
    #[error("Request to {endpoint} failed with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("Unexpected response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub trait RemoteTree {
    /// Children of `parent` in display order.
    fn children(&self, parent: &NodeId) -> Result<Vec<RemoteNode>, RemoteError>;

    /// Appends a new block as the last child of `parent`.
    fn create_child(&self, parent: &NodeId, block: NewBlock<'_>) -> Result<NodeId, RemoteError>;

    fn move_node(&self, node: &NodeId, placement: Placement<'_>) -> Result<(), RemoteError>;
}

impl<T: RemoteTree + ?Sized> RemoteTree for &T {
    fn children(&self, parent: &NodeId) -> Result<Vec<RemoteNode>, RemoteError> {
        (**self).children(parent)
    }

    fn create_child(&self, parent: &NodeId, block: NewBlock<'_>) -> Result<NodeId, RemoteError> {
        (**self).create_child(parent, block)
    }

    fn move_node(&self, node: &NodeId, placement: Placement<'_>) -> Result<(), RemoteError> {
        (**self).move_node(node, placement)
    }
}

/// An authenticated tree plus the page highlights go under.
#[derive(Debug)]
pub struct Session<T> {
    pub tree: T,
    pub root: NodeId,
}

impl<T: RemoteTree> Session<T> {
    pub fn new(tree: T, root: NodeId) -> Self {
        Session { tree, root }
    }

    /// Titles of the root's children, skipping untitled blocks.
    pub fn section_titles(&self) -> Result<Vec<String>, RemoteError> {
        Ok(self
            .tree
            .children(&self.root)?
            .into_iter()
            .filter_map(|node| node.title)
            .collect())
    }

    /// First root child titled `title`. Later duplicates are never returned.
    pub fn find_section(&self, title: &str) -> Result<Option<NodeId>, RemoteError> {
        Ok(self
            .tree
            .children(&self.root)?
            .into_iter()
            .find(|node| node.has_title(title))
            .map(|node| node.id))
    }
}

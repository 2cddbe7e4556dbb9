//! Node-Revision Store
//!
//! Durable table of node-revision records keyed by [`NodeId`]. Records are
//! mutable while the transaction that created them is live and immutable
//! forever after it commits.

pub mod persistence;

use crate::error::FsError;
use crate::types::{ContentRef, NodeId, TxnName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Directory,
}

/// Content of a node-revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeContent {
    File {
        data: Option<ContentRef>,
        length: u64,
    },
    /// Child name to child node-revision; order carries no meaning.
    Directory { entries: BTreeMap<String, NodeId> },
}

/// One version of one file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRevision {
    pub content: NodeContent,
    /// Owning transaction while mutable; `None` once committed.
    pub txn: Option<TxnName>,
    /// Node-revision this one was copied from.
    pub predecessor: Option<NodeId>,
    pub props: BTreeMap<String, String>,
}

impl NodeRevision {
    pub fn new_file(txn: Option<TxnName>) -> Self {
        Self {
            content: NodeContent::File {
                data: None,
                length: 0,
            },
            txn,
            predecessor: None,
            props: BTreeMap::new(),
        }
    }

    pub fn new_directory(txn: Option<TxnName>) -> Self {
        Self {
            content: NodeContent::Directory {
                entries: BTreeMap::new(),
            },
            txn,
            predecessor: None,
            props: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.content {
            NodeContent::File { .. } => NodeKind::File,
            NodeContent::Directory { .. } => NodeKind::Directory,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind() == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    pub fn is_immutable(&self) -> bool {
        self.txn.is_none()
    }

    /// True if `txn` may still modify this record.
    pub fn is_mutable_in(&self, txn: &TxnName) -> bool {
        self.txn.as_ref() == Some(txn)
    }

    pub fn entries(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.content {
            NodeContent::Directory { entries } => Some(entries),
            NodeContent::File { .. } => None,
        }
    }

    pub fn entries_mut(&mut self) -> Option<&mut BTreeMap<String, NodeId>> {
        match &mut self.content {
            NodeContent::Directory { entries } => Some(entries),
            NodeContent::File { .. } => None,
        }
    }
}

/// Keyed storage of node-revisions.
///
/// Implemented by [`crate::trail::Trail`] only, so every call runs inside an
/// atomic unit.
pub trait NodeRevisionStore {
    /// Fetch the record at `id`.
    fn get_node(&self, id: &NodeId) -> Result<NodeRevision, FsError>;

    /// Store `record` at `id`. Fails if an immutable record already lives there.
    fn put_node(&self, id: &NodeId, record: &NodeRevision) -> Result<(), FsError>;

    /// Delete the mutable record at `id`.
    fn delete_node(&self, id: &NodeId) -> Result<(), FsError>;

    /// Allocate the first id of a brand new lineage.
    fn new_lineage(&self) -> Result<NodeId, FsError>;

    /// Allocate the next id in the lineage of `id`.
    fn new_successor(&self, id: &NodeId) -> Result<NodeId, FsError>;
}

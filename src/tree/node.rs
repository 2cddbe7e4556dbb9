//! DAG node handles.

use crate::error::FsError;
use crate::store::{NodeContent, NodeKind, NodeRevision, NodeRevisionStore};
use crate::types::{ContentRef, NodeId, TxnName};
use std::collections::BTreeMap;

/// A node-revision fetched from the store together with its id.
///
/// The handle is a snapshot taken inside one trail; it must not be kept
/// across trails.
#[derive(Debug, Clone)]
pub struct DagNode {
    id: NodeId,
    revision: NodeRevision,
}

impl DagNode {
    pub fn fetch<S: NodeRevisionStore>(store: &S, id: NodeId) -> Result<Self, FsError> {
        Ok(Self {
            id,
            revision: store.get_node(&id)?,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn revision(&self) -> &NodeRevision {
        &self.revision
    }

    pub fn into_revision(self) -> NodeRevision {
        self.revision
    }

    pub fn kind(&self) -> NodeKind {
        self.revision.kind()
    }

    pub fn content(&self) -> &NodeContent {
        &self.revision.content
    }

    pub fn is_directory(&self) -> bool {
        self.revision.is_directory()
    }

    pub fn is_file(&self) -> bool {
        self.revision.is_file()
    }

    /// True iff `txn` owns this node-revision.
    pub fn is_mutable(&self, txn: &TxnName) -> bool {
        self.revision.is_mutable_in(txn)
    }

    pub fn entries(&self) -> Result<&BTreeMap<String, NodeId>, FsError> {
        self.revision
            .entries()
            .ok_or_else(|| FsError::NotADirectory(self.id.to_string()))
    }

    pub fn entry(&self, name: &str) -> Result<Option<NodeId>, FsError> {
        Ok(self.entries()?.get(name).copied())
    }

    /// Blob reference and length of a file.
    pub fn file_data(&self) -> Result<(Option<ContentRef>, u64), FsError> {
        match &self.revision.content {
            NodeContent::File { data, length } => Ok((*data, *length)),
            NodeContent::Directory { .. } => Err(FsError::NotAFile(self.id.to_string())),
        }
    }

    pub fn prop(&self, name: &str) -> Option<&str> {
        self.revision.props.get(name).map(String::as_str)
    }
}

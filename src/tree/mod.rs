//! DAG Layer
//!
//! Versioned nodes and the operations over them. A revision or transaction is
//! only a root [`NodeId`]; every tree below it is reached through directory
//! entries. Read helpers here take a root and a `/`-separated path; mutation
//! lives in [`dag`].

pub mod contents;
pub mod dag;
pub mod hasher;
pub mod node;
pub mod path;

pub use node::DagNode;
pub use path::{open_path, ParentPath, PathStep};

use crate::error::FsError;
use crate::store::{NodeKind, NodeRevisionStore};
use crate::trail::Trail;
use crate::types::NodeId;
use std::collections::{BTreeMap, HashSet};

/// Fetch the node at `path` below `root`.
pub fn lookup(trail: &Trail<'_>, root: NodeId, path: &str) -> Result<DagNode, FsError> {
    let parent_path = open_path(trail, root, path)?;
    DagNode::fetch(trail, parent_path.leaf_id())
}

/// Kind of the node at `path`, or `None` if nothing lives there.
pub fn node_kind(trail: &Trail<'_>, root: NodeId, path: &str) -> Result<Option<NodeKind>, FsError> {
    match lookup(trail, root, path) {
        Ok(node) => Ok(Some(node.kind())),
        Err(FsError::PathNotFound(_)) | Err(FsError::NotADirectory(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn dir_entries(
    trail: &Trail<'_>,
    root: NodeId,
    path: &str,
) -> Result<BTreeMap<String, NodeId>, FsError> {
    let node = lookup(trail, root, path)?;
    node.entries()
        .cloned()
        .map_err(|_| FsError::NotADirectory(path.to_string()))
}

/// Full contents of the file at `path`; empty for a file never written.
pub fn file_contents(trail: &Trail<'_>, root: NodeId, path: &str) -> Result<Vec<u8>, FsError> {
    let node = lookup(trail, root, path)?;
    let (data, _) = node
        .file_data()
        .map_err(|_| FsError::NotAFile(path.to_string()))?;
    match data {
        Some(blob) => contents::read_blob(trail, &blob),
        None => Ok(Vec::new()),
    }
}

pub fn node_prop(
    trail: &Trail<'_>,
    root: NodeId,
    path: &str,
    name: &str,
) -> Result<Option<String>, FsError> {
    Ok(lookup(trail, root, path)?.prop(name).map(str::to_string))
}

/// Every node-revision reachable from `root`, each listed once.
pub fn reachable(trail: &Trail<'_>, root: NodeId) -> Result<Vec<NodeId>, FsError> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        if let Some(entries) = trail.get_node(&id)?.entries() {
            stack.extend(entries.values().copied());
        }
    }
    Ok(order)
}

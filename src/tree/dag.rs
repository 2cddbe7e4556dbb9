//! Copy-on-write operations over node-revisions.
//!
//! This is the only module that creates successor node-revisions. Every
//! mutator requires its target to be mutable in the writing transaction;
//! callers obtain such a node with [`make_path_mutable`].

use crate::error::FsError;
use crate::store::{NodeContent, NodeKind, NodeRevision, NodeRevisionStore};
use crate::trail::Trail;
use crate::tree::contents::store_blob;
use crate::tree::path::{validate_entry_name, ParentPath};
use crate::txn::table;
use crate::types::{NodeId, TxnName};
use tracing::trace;

/// Re-read `id` and report whether `txn` may modify it.
pub fn check_mutable(trail: &Trail<'_>, id: NodeId, txn: &TxnName) -> Result<bool, FsError> {
    Ok(trail.get_node(&id)?.is_mutable_in(txn))
}

fn require_mutable(trail: &Trail<'_>, id: NodeId, txn: &TxnName) -> Result<NodeRevision, FsError> {
    let record = trail.get_node(&id)?;
    if !record.is_mutable_in(txn) {
        return Err(FsError::MutabilityViolation(id));
    }
    Ok(record)
}

/// Return a node-revision of `id`'s lineage that `txn` may modify.
///
/// An id already mutable in `txn` is returned as is. Otherwise a successor is
/// allocated holding a shallow copy: directory entries are copied, file
/// contents share the same blob.
pub fn copy_on_write(trail: &Trail<'_>, id: NodeId, txn: &TxnName) -> Result<NodeId, FsError> {
    let record = trail.get_node(&id)?;
    if record.is_mutable_in(txn) {
        return Ok(id);
    }
    let new_id = trail.new_successor(&id)?;
    let copy = NodeRevision {
        txn: Some(txn.clone()),
        predecessor: Some(id),
        ..record
    };
    trail.put_node(&new_id, &copy)?;
    trace!(from = %id, to = %new_id, txn = %txn, "Copied node revision");
    Ok(new_id)
}

/// Make every node on `path` mutable in `txn`, from the root down.
///
/// Each ancestor that is still shared is copied and the entry of its own
/// parent (or the transaction's root pointer) is rewritten to the copy. The
/// recorded ids in `path` are updated in place. Returns the leaf's id.
pub fn make_path_mutable(
    trail: &Trail<'_>,
    txn: &TxnName,
    path: &mut ParentPath,
) -> Result<NodeId, FsError> {
    let depth = path.depth();
    make_mutable_at(trail, txn, path, depth)
}

fn make_mutable_at(
    trail: &Trail<'_>,
    txn: &TxnName,
    path: &mut ParentPath,
    depth: usize,
) -> Result<NodeId, FsError> {
    let current = path.step(depth).id;
    // A mutable node is only reachable through mutable ancestors.
    if check_mutable(trail, current, txn)? {
        return Ok(current);
    }

    let new_id = if depth == 0 {
        let new_root = copy_on_write(trail, current, txn)?;
        table::set_root(trail, txn, new_root)?;
        new_root
    } else {
        let parent = make_mutable_at(trail, txn, path, depth - 1)?;
        let name = path
            .step(depth)
            .name
            .clone()
            .ok_or_else(|| FsError::InvalidPath(path.path_string()))?;
        let child = copy_on_write(trail, current, txn)?;
        set_entry(trail, txn, parent, &name, child)?;
        child
    };
    path.set_id(depth, new_id);
    Ok(new_id)
}

/// Point entry `name` of the mutable directory `parent` at `child`.
pub fn set_entry(
    trail: &Trail<'_>,
    txn: &TxnName,
    parent: NodeId,
    name: &str,
    child: NodeId,
) -> Result<(), FsError> {
    let mut record = require_mutable(trail, parent, txn)?;
    record
        .entries_mut()
        .ok_or_else(|| FsError::NotADirectory(parent.to_string()))?
        .insert(name.to_string(), child);
    trail.put_node(&parent, &record)
}

/// Create an empty file or directory named `name` in the mutable directory
/// `parent`.
pub fn make_entry(
    trail: &Trail<'_>,
    txn: &TxnName,
    parent: NodeId,
    name: &str,
    kind: NodeKind,
) -> Result<NodeId, FsError> {
    let name = validate_entry_name(name)?;
    let mut record = require_mutable(trail, parent, txn)?;
    let entries = record
        .entries_mut()
        .ok_or_else(|| FsError::NotADirectory(parent.to_string()))?;
    if entries.contains_key(&name) {
        return Err(FsError::AlreadyExists(name));
    }

    let id = trail.new_lineage()?;
    let child = match kind {
        NodeKind::File => NodeRevision::new_file(Some(txn.clone())),
        NodeKind::Directory => NodeRevision::new_directory(Some(txn.clone())),
    };
    trail.put_node(&id, &child)?;
    entries.insert(name, id);
    trail.put_node(&parent, &record)?;
    Ok(id)
}

/// Remove entry `name` from the mutable directory `parent`, deleting whatever
/// part of the removed subtree `txn` owns.
pub fn delete_entry(
    trail: &mut Trail<'_>,
    txn: &TxnName,
    parent: NodeId,
    name: &str,
) -> Result<usize, FsError> {
    let mut record = require_mutable(trail, parent, txn)?;
    let child = record
        .entries_mut()
        .ok_or_else(|| FsError::NotADirectory(parent.to_string()))?
        .remove(name)
        .ok_or_else(|| FsError::PathNotFound(name.to_string()))?;
    trail.put_node(&parent, &record)?;
    delete_if_mutable(trail, child, txn)
}

/// Replace the contents of the mutable file `node`.
pub fn set_contents(
    trail: &Trail<'_>,
    txn: &TxnName,
    node: NodeId,
    bytes: &[u8],
) -> Result<(), FsError> {
    let mut record = require_mutable(trail, node, txn)?;
    if !record.is_file() {
        return Err(FsError::NotAFile(node.to_string()));
    }
    let blob = store_blob(trail, bytes)?;
    record.content = NodeContent::File {
        data: Some(blob),
        length: bytes.len() as u64,
    };
    trail.put_node(&node, &record)
}

/// Set (`Some`) or remove (`None`) a property on the mutable `node`.
pub fn set_node_prop(
    trail: &Trail<'_>,
    txn: &TxnName,
    node: NodeId,
    name: &str,
    value: Option<&str>,
) -> Result<(), FsError> {
    let mut record = require_mutable(trail, node, txn)?;
    match value {
        Some(value) => {
            record.props.insert(name.to_string(), value.to_string());
        }
        None => {
            record.props.remove(name);
        }
    }
    trail.put_node(&node, &record)
}

/// Delete `id` and every node below it that `txn` owns.
///
/// Each record's mutability is read at visit time. The walk stops at nodes
/// `txn` does not own, so shared subtrees are never touched. Returns the
/// number of node-revisions deleted.
pub fn delete_if_mutable(
    trail: &mut Trail<'_>,
    id: NodeId,
    txn: &TxnName,
) -> Result<usize, FsError> {
    if !trail.first_visit(id) {
        return Ok(0);
    }
    let record = trail.get_node(&id)?;
    if !record.is_mutable_in(txn) {
        return Ok(0);
    }

    let mut deleted = 0;
    if let Some(entries) = record.entries() {
        for child in entries.values() {
            deleted += delete_if_mutable(trail, *child, txn)?;
        }
    }
    trail.delete_node(&id)?;
    Ok(deleted + 1)
}

/// Mark `id` and every node below it that `txn` owns as immutable.
/// Returns the number of node-revisions frozen.
pub fn freeze(trail: &mut Trail<'_>, id: NodeId, txn: &TxnName) -> Result<usize, FsError> {
    if !trail.first_visit(id) {
        return Ok(0);
    }
    let mut record = trail.get_node(&id)?;
    if !record.is_mutable_in(txn) {
        return Ok(0);
    }

    let mut frozen = 0;
    if let Some(entries) = record.entries() {
        for child in entries.values() {
            frozen += freeze(trail, *child, txn)?;
        }
    }
    record.txn = None;
    trail.put_node(&id, &record)?;
    Ok(frozen + 1)
}

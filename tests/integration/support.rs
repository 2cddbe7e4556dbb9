//! Shared fixtures.

use arbor::config::{ArborConfig, StorageConfig, TrailConfig};
use arbor::store::NodeRevisionStore;
use arbor::{Filesystem, NodeId, NodeRevision, Revnum};
use std::collections::HashMap;

/// Fresh temporary store.
pub fn temp_fs() -> Filesystem {
    fs_with_trail(TrailConfig::default())
}

/// Fresh temporary store with a custom retry policy.
pub fn fs_with_trail(trail: TrailConfig) -> Filesystem {
    Filesystem::create(&ArborConfig {
        storage: StorageConfig::temporary(),
        trail,
        ..ArborConfig::default()
    })
    .unwrap()
}

/// Commit `files` (path, contents) on top of the youngest revision, creating
/// parent directories as needed.
pub fn commit_files(fs: &Filesystem, files: &[(&str, &[u8])]) -> Revnum {
    let txn = fs.begin_txn(fs.youngest_rev().unwrap()).unwrap();
    for (path, contents) in files {
        let parts: Vec<&str> = path.split('/').collect();
        for depth in 1..parts.len() {
            let dir = parts[..depth].join("/");
            if txn.node_kind(&dir).unwrap().is_none() {
                txn.make_dir(&dir).unwrap();
            }
        }
        if txn.node_kind(path).unwrap().is_none() {
            txn.make_file(path).unwrap();
        }
        txn.write_file(path, contents).unwrap();
    }
    txn.commit().unwrap()
}

/// Every node-revision reachable from revision `rev`, with its record.
pub fn snapshot(fs: &Filesystem, rev: Revnum) -> HashMap<NodeId, NodeRevision> {
    let root = fs.revision(rev).unwrap().root;
    fs.with_trail(|trail| {
        let mut records = HashMap::new();
        for id in arbor::tree::reachable(trail, root)? {
            records.insert(id, trail.get_node(&id)?);
        }
        Ok(records)
    })
    .unwrap()
}

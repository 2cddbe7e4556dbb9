//! Sled-backed tables and record codecs.

use crate::error::{FsError, StorageError};
use crate::store::{NodeRevision, NodeRevisionStore};
use crate::trail::Trail;
use crate::types::NodeId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::TransactionalTree;

pub(crate) const NODES: &str = "nodes";
pub(crate) const REVISIONS: &str = "revisions";
pub(crate) const TRANSACTIONS: &str = "transactions";
pub(crate) const STRINGS: &str = "strings";
pub(crate) const LOCKS: &str = "locks";
pub(crate) const META: &str = "meta";

/// Next unused lineage number.
pub(crate) const NEXT_LINEAGE_KEY: &[u8] = b"next-lineage";
/// Counter behind transaction names.
pub(crate) const NEXT_TXN_KEY: &[u8] = b"next-txn";
/// Counter mixed into lock tokens.
pub(crate) const NEXT_LOCK_KEY: &[u8] = b"next-lock";
/// Number of the youngest revision.
pub(crate) const YOUNGEST_KEY: &[u8] = b"youngest";
/// Set of live transaction names.
pub(crate) const TXN_INDEX_KEY: &[u8] = b"txn-index";

/// The named sled trees making up one store.
pub struct Tables {
    pub(crate) db: sled::Db,
    pub(crate) nodes: sled::Tree,
    pub(crate) revisions: sled::Tree,
    pub(crate) transactions: sled::Tree,
    pub(crate) strings: sled::Tree,
    pub(crate) locks: sled::Tree,
    pub(crate) meta: sled::Tree,
}

impl Tables {
    pub fn open(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            nodes: db.open_tree(NODES)?,
            revisions: db.open_tree(REVISIONS)?,
            transactions: db.open_tree(TRANSACTIONS)?,
            strings: db.open_tree(STRINGS)?,
            locks: db.open_tree(LOCKS)?,
            meta: db.open_tree(META)?,
            db,
        })
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> Result<usize, StorageError> {
        Ok(self.db.flush()?)
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, FsError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(table: &'static str, bytes: &[u8]) -> Result<T, FsError> {
    bincode::deserialize(bytes).map_err(|e| {
        FsError::BackendFailure(StorageError::Corrupt {
            table,
            detail: e.to_string(),
        })
    })
}

pub(crate) fn read_u64(tree: &TransactionalTree, key: &[u8]) -> Result<Option<u64>, FsError> {
    match tree.get(key)? {
        Some(bytes) => {
            let raw = <[u8; 8]>::try_from(&bytes[..]).map_err(|_| {
                FsError::BackendFailure(StorageError::Corrupt {
                    table: META,
                    detail: format!("counter {} is {} bytes", String::from_utf8_lossy(key), bytes.len()),
                })
            })?;
            Ok(Some(u64::from_be_bytes(raw)))
        }
        None => Ok(None),
    }
}

pub(crate) fn write_u64(tree: &TransactionalTree, key: &[u8], value: u64) -> Result<(), FsError> {
    tree.insert(key, &value.to_be_bytes()[..])?;
    Ok(())
}

/// Hand out the counter at `key` (or `initial` if unset) and advance it.
pub(crate) fn next_counter(
    tree: &TransactionalTree,
    key: &[u8],
    initial: u64,
) -> Result<u64, FsError> {
    let value = read_u64(tree, key)?.unwrap_or(initial);
    write_u64(tree, key, value + 1)?;
    Ok(value)
}

fn copy_counter_key(id: &NodeId) -> Vec<u8> {
    let mut key = b"copy/".to_vec();
    key.extend_from_slice(&id.lineage().to_be_bytes());
    key
}

impl NodeRevisionStore for Trail<'_> {
    fn get_node(&self, id: &NodeId) -> Result<NodeRevision, FsError> {
        self.note_read();
        match self.nodes.get(&id.to_key()[..])? {
            Some(bytes) => decode(NODES, &bytes),
            None => Err(FsError::NodeNotFound(*id)),
        }
    }

    fn put_node(&self, id: &NodeId, record: &NodeRevision) -> Result<(), FsError> {
        let key = id.to_key();
        if let Some(bytes) = self.nodes.get(&key[..])? {
            let existing: NodeRevision = decode(NODES, &bytes)?;
            if existing.is_immutable() {
                return Err(FsError::MutabilityViolation(*id));
            }
        }
        self.note_write();
        self.nodes.insert(&key[..], encode(record)?)?;
        Ok(())
    }

    fn delete_node(&self, id: &NodeId) -> Result<(), FsError> {
        let existing = self.get_node(id)?;
        if existing.is_immutable() {
            return Err(FsError::MutabilityViolation(*id));
        }
        self.note_write();
        self.nodes.remove(&id.to_key()[..])?;
        Ok(())
    }

    fn new_lineage(&self) -> Result<NodeId, FsError> {
        // Lineage 0 belongs to the root of revision 0.
        let lineage = next_counter(self.meta, NEXT_LINEAGE_KEY, 1)?;
        Ok(NodeId::new(lineage, 0))
    }

    fn new_successor(&self, id: &NodeId) -> Result<NodeId, FsError> {
        let copy = next_counter(self.meta, &copy_counter_key(id), 1)?;
        Ok(NodeId::new(id.lineage(), copy))
    }
}

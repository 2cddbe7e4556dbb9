//! Transactions
//!
//! A transaction stages edits against a base revision. Its tree starts out
//! as the base revision's root and diverges through copy-on-write as it is
//! edited; every node it creates stays mutable until the transaction is
//! committed or aborted. All durable state lives in the `transactions` table,
//! so a transaction outlives the [`Transaction`] handle that began it.

pub mod table;

pub use table::TransactionRecord;

use crate::error::FsError;
use crate::fs::Filesystem;
use crate::revision::{self, table as revision_table};
use crate::store::NodeKind;
use crate::trail::Trail;
use crate::tree::path::{split_path, ParentPath};
use crate::tree::{self, dag};
use crate::types::{NodeId, Revnum, TxnName};
use std::collections::BTreeMap;
use tracing::info;

/// Handle to a live transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    fs: Filesystem,
    name: TxnName,
}

impl Filesystem {
    /// Begin a transaction based on revision `base`.
    pub fn begin_txn(&self, base: Revnum) -> Result<Transaction, FsError> {
        let name = self.with_trail(|trail| {
            let base_root = revision_table::get(trail, base)?.root;
            table::create(trail, base, base_root)
        })?;
        info!(txn = %name, base = %base, "Began transaction");
        Ok(Transaction {
            fs: self.clone(),
            name,
        })
    }

    /// Reattach to a transaction by name.
    pub fn open_txn(&self, name: &str) -> Result<Transaction, FsError> {
        let name = TxnName::new(name);
        self.with_trail(|trail| table::get(trail, &name).map(|_| ()))?;
        Ok(Transaction {
            fs: self.clone(),
            name,
        })
    }

    /// Names of every live transaction.
    pub fn list_transactions(&self) -> Result<Vec<TxnName>, FsError> {
        self.with_trail(|trail| table::list(trail))
    }
}

/// Split a path into its parent components and final entry name.
fn split_parent(path: &str) -> Result<(Vec<String>, String), FsError> {
    let mut components = split_path(path)?;
    let name = components
        .pop()
        .ok_or_else(|| FsError::InvalidPath("the root has no parent".to_string()))?;
    Ok((components, name))
}

impl Transaction {
    pub fn name(&self) -> &TxnName {
        &self.name
    }

    pub fn filesystem(&self) -> &Filesystem {
        &self.fs
    }

    /// Durable record of this transaction.
    pub fn record(&self) -> Result<TransactionRecord, FsError> {
        self.fs.with_trail(|trail| table::get(trail, &self.name))
    }

    pub fn base_revision(&self) -> Result<Revnum, FsError> {
        Ok(self.record()?.base_rev)
    }

    /// Current root of the transaction's tree.
    pub fn root_id(&self) -> Result<NodeId, FsError> {
        Ok(self.record()?.root)
    }

    /// Set (`Some`) or remove (`None`) a transaction property.
    pub fn set_prop(&self, name: &str, value: Option<&str>) -> Result<(), FsError> {
        self.fs.with_trail(|trail| {
            let mut record = table::get(trail, &self.name)?;
            match value {
                Some(value) => {
                    record.props.insert(name.to_string(), value.to_string());
                }
                None => {
                    record.props.remove(name);
                }
            }
            table::put(trail, &self.name, &record)
        })
    }

    pub fn props(&self) -> Result<BTreeMap<String, String>, FsError> {
        Ok(self.record()?.props)
    }

    fn root(&self, trail: &Trail<'_>) -> Result<NodeId, FsError> {
        Ok(table::get(trail, &self.name)?.root)
    }

    /// Walk `components` and make every node on the way mutable.
    fn mutable_path(&self, trail: &Trail<'_>, components: &[String]) -> Result<NodeId, FsError> {
        let mut path = ParentPath::open(trail, self.root(trail)?, components)?;
        dag::make_path_mutable(trail, &self.name, &mut path)
    }

    pub fn make_dir(&self, path: &str) -> Result<NodeId, FsError> {
        self.make_node(path, NodeKind::Directory)
    }

    /// Create an empty file.
    pub fn make_file(&self, path: &str) -> Result<NodeId, FsError> {
        self.make_node(path, NodeKind::File)
    }

    fn make_node(&self, path: &str, kind: NodeKind) -> Result<NodeId, FsError> {
        let (parent, name) = split_parent(path)?;
        self.fs.with_trail(|trail| {
            let dir = self.mutable_path(trail, &parent)?;
            dag::make_entry(trail, &self.name, dir, &name, kind)
        })
    }

    /// Replace the contents of an existing file.
    pub fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), FsError> {
        let components = split_path(path)?;
        self.fs.with_trail(|trail| {
            let file = self.mutable_path(trail, &components)?;
            dag::set_contents(trail, &self.name, file, bytes)
        })
    }

    /// Remove the entry at `path` together with the subtree below it.
    pub fn delete(&self, path: &str) -> Result<(), FsError> {
        let (parent, name) = split_parent(path)?;
        self.fs.with_trail(|trail| {
            let dir = self.mutable_path(trail, &parent)?;
            dag::delete_entry(trail, &self.name, dir, &name)?;
            Ok(())
        })
    }

    /// Set (`Some`) or remove (`None`) a property on the node at `path`.
    pub fn set_node_prop(&self, path: &str, name: &str, value: Option<&str>) -> Result<(), FsError> {
        let components = split_path(path)?;
        self.fs.with_trail(|trail| {
            let node = self.mutable_path(trail, &components)?;
            dag::set_node_prop(trail, &self.name, node, name, value)
        })
    }

    pub fn node_id(&self, path: &str) -> Result<NodeId, FsError> {
        self.fs
            .with_trail(|trail| Ok(tree::lookup(trail, self.root(trail)?, path)?.id()))
    }

    pub fn node_kind(&self, path: &str) -> Result<Option<NodeKind>, FsError> {
        self.fs
            .with_trail(|trail| tree::node_kind(trail, self.root(trail)?, path))
    }

    pub fn dir_entries(&self, path: &str) -> Result<BTreeMap<String, NodeId>, FsError> {
        self.fs
            .with_trail(|trail| tree::dir_entries(trail, self.root(trail)?, path))
    }

    pub fn file_contents(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.fs
            .with_trail(|trail| tree::file_contents(trail, self.root(trail)?, path))
    }

    pub fn node_prop(&self, path: &str, name: &str) -> Result<Option<String>, FsError> {
        self.fs
            .with_trail(|trail| tree::node_prop(trail, self.root(trail)?, path, name))
    }

    /// Publish the transaction as the next revision.
    pub fn commit(&self) -> Result<Revnum, FsError> {
        let rev = self
            .fs
            .with_trail(|trail| revision::commit_txn(trail, &self.name))?;
        info!(txn = %self.name, rev = %rev, "Committed transaction");
        Ok(rev)
    }

    /// Delete every node the transaction created, then the transaction.
    ///
    /// Nodes shared with committed revisions are never touched. A second
    /// abort of the same transaction fails with
    /// [`FsError::TransactionNotFound`].
    pub fn abort(&self) -> Result<(), FsError> {
        let deleted = self.fs.with_trail(|trail| {
            let root = self.root(trail)?;
            let deleted = dag::delete_if_mutable(trail, root, &self.name)?;
            table::delete(trail, &self.name)?;
            Ok(deleted)
        })?;
        info!(txn = %self.name, deleted, "Aborted transaction");
        Ok(())
    }

    /// Drop the handle. The transaction stays open and can be reattached with
    /// [`Filesystem::open_txn`].
    pub fn close(self) {}
}

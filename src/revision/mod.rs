//! Revisions
//!
//! The append-only history of the store. Each revision is the root of an
//! immutable tree; revision `n + 1` is produced by committing a transaction.

pub mod table;

pub use table::RevisionRecord;

use crate::error::FsError;
use crate::fs::Filesystem;
use crate::store::NodeKind;
use crate::trail::Trail;
use crate::tree::{self, dag};
use crate::txn::table as txn_table;
use crate::types::{NodeId, Revnum, TxnName};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// How a caller names a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionSpec {
    Youngest,
    Number(Revnum),
    /// Youngest revision at or before the instant.
    Date(DateTime<Utc>),
}

impl RevisionSpec {
    /// Build a selector from optional number and date arguments. Giving both
    /// is an error; giving neither means the youngest revision.
    pub fn from_args(rev: Option<Revnum>, date: Option<DateTime<Utc>>) -> Result<Self, FsError> {
        match (rev, date) {
            (Some(_), Some(_)) => Err(FsError::MutuallyExclusiveArguments(
                "a revision number and a date cannot both be given".to_string(),
            )),
            (Some(rev), None) => Ok(RevisionSpec::Number(rev)),
            (None, Some(date)) => Ok(RevisionSpec::Date(date)),
            (None, None) => Ok(RevisionSpec::Youngest),
        }
    }
}

/// Turn transaction `name` into the next revision.
///
/// Freezes every node the transaction owns, appends the revision record and
/// removes the transaction. Must run inside a single trail.
pub(crate) fn commit_txn(trail: &mut Trail<'_>, name: &TxnName) -> Result<Revnum, FsError> {
    let record = txn_table::get(trail, name)?;
    let frozen = dag::freeze(trail, record.root, name)?;
    let rev = table::append(trail, record.root, Some(name.clone()), record.props)?;
    txn_table::delete(trail, name)?;
    debug!(txn = %name, rev = %rev, frozen, attempt = trail.attempt(), "Committed transaction");
    Ok(rev)
}

/// Read-only view of one revision's tree.
#[derive(Debug, Clone)]
pub struct RevisionRoot {
    fs: Filesystem,
    rev: Revnum,
    record: RevisionRecord,
}

impl RevisionRoot {
    pub fn revision(&self) -> Revnum {
        self.rev
    }

    pub fn record(&self) -> &RevisionRecord {
        &self.record
    }

    pub fn root_id(&self) -> NodeId {
        self.record.root
    }

    pub fn node_id(&self, path: &str) -> Result<NodeId, FsError> {
        let root = self.record.root;
        self.fs
            .with_trail(|trail| Ok(tree::lookup(trail, root, path)?.id()))
    }

    pub fn node_kind(&self, path: &str) -> Result<Option<NodeKind>, FsError> {
        let root = self.record.root;
        self.fs.with_trail(|trail| tree::node_kind(trail, root, path))
    }

    pub fn dir_entries(&self, path: &str) -> Result<BTreeMap<String, NodeId>, FsError> {
        let root = self.record.root;
        self.fs.with_trail(|trail| tree::dir_entries(trail, root, path))
    }

    pub fn file_contents(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let root = self.record.root;
        self.fs
            .with_trail(|trail| tree::file_contents(trail, root, path))
    }

    pub fn node_prop(&self, path: &str, name: &str) -> Result<Option<String>, FsError> {
        let root = self.record.root;
        self.fs
            .with_trail(|trail| tree::node_prop(trail, root, path, name))
    }
}

impl Filesystem {
    pub fn youngest_rev(&self) -> Result<Revnum, FsError> {
        self.with_trail(|trail| table::youngest(trail))
    }

    pub fn revision(&self, rev: Revnum) -> Result<RevisionRecord, FsError> {
        self.with_trail(|trail| table::get(trail, rev))
    }

    pub fn revision_root(&self, rev: Revnum) -> Result<RevisionRoot, FsError> {
        let record = self.revision(rev)?;
        Ok(RevisionRoot {
            fs: self.clone(),
            rev,
            record,
        })
    }

    /// Youngest revision dated at or before `date`.
    pub fn revision_at(&self, date: DateTime<Utc>) -> Result<Revnum, FsError> {
        self.with_trail(|trail| table::revision_at(trail, date))
    }

    /// Resolve a selector to a concrete revision number.
    pub fn resolve_revision(&self, spec: RevisionSpec) -> Result<Revnum, FsError> {
        match spec {
            RevisionSpec::Youngest => self.youngest_rev(),
            RevisionSpec::Number(rev) => {
                // Existence check.
                self.revision(rev)?;
                Ok(rev)
            }
            RevisionSpec::Date(date) => self.revision_at(date),
        }
    }
}

//! The `transactions` table.

use crate::error::FsError;
use crate::store::persistence::{decode, encode, next_counter, NEXT_TXN_KEY, TRANSACTIONS, TXN_INDEX_KEY};
use crate::trail::Trail;
use crate::types::{NodeId, Revnum, TxnName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Durable state of one live transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Current root; equals `base_root` until the first edit.
    pub root: NodeId,
    pub base_root: NodeId,
    pub base_rev: Revnum,
    pub created: DateTime<Utc>,
    /// Copied onto the revision at commit.
    pub props: BTreeMap<String, String>,
}

/// Allocate a name and store a fresh record rooted at `base_root`.
pub(crate) fn create(
    trail: &Trail<'_>,
    base_rev: Revnum,
    base_root: NodeId,
) -> Result<TxnName, FsError> {
    let name = TxnName::from_counter(next_counter(trail.meta, NEXT_TXN_KEY, 0)?);
    let record = TransactionRecord {
        root: base_root,
        base_root,
        base_rev,
        created: Utc::now(),
        props: BTreeMap::new(),
    };
    put(trail, &name, &record)?;

    let mut index = read_index(trail)?;
    index.insert(name.clone());
    write_index(trail, &index)?;
    Ok(name)
}

pub(crate) fn get(trail: &Trail<'_>, name: &TxnName) -> Result<TransactionRecord, FsError> {
    trail.note_read();
    match trail.transactions.get(name.as_str().as_bytes())? {
        Some(bytes) => decode(TRANSACTIONS, &bytes),
        None => Err(FsError::TransactionNotFound(name.to_string())),
    }
}

pub(crate) fn put(
    trail: &Trail<'_>,
    name: &TxnName,
    record: &TransactionRecord,
) -> Result<(), FsError> {
    trail.note_write();
    trail
        .transactions
        .insert(name.as_str().as_bytes(), encode(record)?)?;
    Ok(())
}

/// Point the transaction at a new (mutable) root.
pub(crate) fn set_root(trail: &Trail<'_>, name: &TxnName, root: NodeId) -> Result<(), FsError> {
    let mut record = get(trail, name)?;
    if record.root != root {
        record.root = root;
        put(trail, name, &record)?;
    }
    Ok(())
}

/// Remove the record and its index entry.
pub(crate) fn delete(trail: &Trail<'_>, name: &TxnName) -> Result<(), FsError> {
    if trail.transactions.remove(name.as_str().as_bytes())?.is_none() {
        return Err(FsError::TransactionNotFound(name.to_string()));
    }
    trail.note_write();

    let mut index = read_index(trail)?;
    index.remove(name);
    write_index(trail, &index)
}

/// Names of every live transaction, sorted.
pub(crate) fn list(trail: &Trail<'_>) -> Result<Vec<TxnName>, FsError> {
    Ok(read_index(trail)?.into_iter().collect())
}

// Sled transactions cannot scan, so the set of names is kept in one record.
fn read_index(trail: &Trail<'_>) -> Result<BTreeSet<TxnName>, FsError> {
    match trail.meta.get(TXN_INDEX_KEY)? {
        Some(bytes) => decode(TRANSACTIONS, &bytes),
        None => Ok(BTreeSet::new()),
    }
}

fn write_index(trail: &Trail<'_>, index: &BTreeSet<TxnName>) -> Result<(), FsError> {
    trail.meta.insert(TXN_INDEX_KEY, encode(index)?)?;
    Ok(())
}

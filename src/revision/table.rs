//! The `revisions` table: revision number to root, append-only.

use crate::error::{FsError, StorageError};
use crate::store::persistence::{decode, encode, read_u64, write_u64, META, REVISIONS, YOUNGEST_KEY};
use crate::trail::Trail;
use crate::types::{NodeId, Revnum, TxnName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One committed revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub root: NodeId,
    /// Never earlier than the date of the previous revision.
    pub date: DateTime<Utc>,
    /// Transaction this revision was committed from; `None` for revision 0.
    pub txn: Option<TxnName>,
    pub props: BTreeMap<String, String>,
}

pub(crate) fn get(trail: &Trail<'_>, rev: Revnum) -> Result<RevisionRecord, FsError> {
    trail.note_read();
    match trail.revisions.get(&rev.to_key()[..])? {
        Some(bytes) => decode(REVISIONS, &bytes),
        None => Err(FsError::RevisionNotFound(rev)),
    }
}

pub(crate) fn youngest(trail: &Trail<'_>) -> Result<Revnum, FsError> {
    read_u64(trail.meta, YOUNGEST_KEY)?
        .map(Revnum::new)
        .ok_or_else(|| {
            FsError::BackendFailure(StorageError::Corrupt {
                table: META,
                detail: "youngest revision is not recorded".to_string(),
            })
        })
}

/// Write revision 0 rooted at `root`.
pub(crate) fn init(trail: &Trail<'_>, root: NodeId) -> Result<(), FsError> {
    let record = RevisionRecord {
        root,
        date: Utc::now(),
        txn: None,
        props: BTreeMap::new(),
    };
    put(trail, Revnum::ZERO, &record)?;
    write_u64(trail.meta, YOUNGEST_KEY, 0)
}

/// Publish `root` as revision youngest + 1 and return its number.
pub(crate) fn append(
    trail: &Trail<'_>,
    root: NodeId,
    txn: Option<TxnName>,
    props: BTreeMap<String, String>,
) -> Result<Revnum, FsError> {
    let youngest = youngest(trail)?;
    let previous = get(trail, youngest)?;
    let rev = youngest.next();
    let record = RevisionRecord {
        root,
        date: Utc::now().max(previous.date),
        txn,
        props,
    };
    put(trail, rev, &record)?;
    write_u64(trail.meta, YOUNGEST_KEY, rev.as_u64())?;
    Ok(rev)
}

fn put(trail: &Trail<'_>, rev: Revnum, record: &RevisionRecord) -> Result<(), FsError> {
    trail.note_write();
    trail.revisions.insert(&rev.to_key()[..], encode(record)?)?;
    Ok(())
}

/// Youngest revision dated at or before `date`; revision 0 when `date`
/// precedes every revision.
pub(crate) fn revision_at(trail: &Trail<'_>, date: DateTime<Utc>) -> Result<Revnum, FsError> {
    let mut lo = 0u64;
    let mut hi = youngest(trail)?.as_u64();
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if get(trail, Revnum::new(mid))?.date <= date {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(Revnum::new(lo))
}

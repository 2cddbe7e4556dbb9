//! Content blob store.
//!
//! File contents live in the `strings` table keyed by their blake3 hash.
//! Blobs are shared by every node-revision that references the same bytes
//! and are never removed when a transaction aborts.
//!
//! Nothing reclaims unreferenced blobs: the `strings` table only grows.

use crate::error::{FsError, StorageError};
use crate::store::persistence::STRINGS;
use crate::trail::Trail;
use crate::tree::hasher::content_ref;
use crate::types::ContentRef;

/// Store `bytes`, returning their content address.
pub fn store_blob(trail: &Trail<'_>, bytes: &[u8]) -> Result<ContentRef, FsError> {
    let key = content_ref(bytes);
    if trail.strings.get(&key.0[..])?.is_none() {
        trail.note_write();
        trail.strings.insert(&key.0[..], bytes)?;
    }
    Ok(key)
}

/// Read the blob behind `key`.
pub fn read_blob(trail: &Trail<'_>, key: &ContentRef) -> Result<Vec<u8>, FsError> {
    trail.note_read();
    match trail.strings.get(&key.0[..])? {
        Some(bytes) => Ok(bytes.to_vec()),
        None => Err(FsError::BackendFailure(StorageError::Corrupt {
            table: STRINGS,
            detail: format!("missing blob {}", key),
        })),
    }
}

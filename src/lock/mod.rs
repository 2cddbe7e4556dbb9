//! Path locks
//!
//! Exclusive, optionally expiring locks on paths, stored in the `locks` table.
//! Each path holds at most one lock; a lock whose expiry has passed reads as
//! absent and is replaced by the next lock taken on its path.
//!
//! Records are kept under two keys: `path/<path>` holds the [`LockRecord`]
//! and `token/<token>` maps the token back to its path.

pub mod token;

pub use token::LockToken;

use crate::error::FsError;
use crate::fs::Filesystem;
use crate::store::persistence::{decode, encode, next_counter, LOCKS, NEXT_LOCK_KEY};
use crate::trail::Trail;
use crate::tree::path::{join_path, split_path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub token: LockToken,
    /// Canonical absolute path
    pub path: String,
    pub owner: String,
    pub comment: Option<String>,
    pub created: DateTime<Utc>,
    /// `None` never expires
    pub expires: Option<DateTime<Utc>>,
}

impl LockRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.map(|at| at <= now).unwrap_or(false)
    }
}

/// Lock operations over one filesystem; obtained from [`Filesystem::locks`].
#[derive(Debug, Clone)]
pub struct LockProvider {
    fs: Filesystem,
}

impl Filesystem {
    pub fn locks(&self) -> LockProvider {
        LockProvider { fs: self.clone() }
    }
}

fn canonical(path: &str) -> Result<String, FsError> {
    Ok(join_path(&split_path(path)?))
}

fn path_key(path: &str) -> Vec<u8> {
    format!("path/{}", path).into_bytes()
}

fn token_key(token: &LockToken) -> Vec<u8> {
    format!("token/{}", token).into_bytes()
}

/// Live lock on `path`, if any. An expired record is erased on sight.
fn read_live(trail: &Trail<'_>, path: &str, now: DateTime<Utc>) -> Result<Option<LockRecord>, FsError> {
    match read_any(trail, path)? {
        Some(record) if record.is_expired(now) => {
            debug!(path = %path, token = %record.token, "Erasing expired lock");
            erase(trail, &record)?;
            Ok(None)
        }
        other => Ok(other),
    }
}

/// Any record on `path`, expired or not.
fn read_any(trail: &Trail<'_>, path: &str) -> Result<Option<LockRecord>, FsError> {
    trail.note_read();
    match trail.locks.get(path_key(path))? {
        Some(bytes) => Ok(Some(decode(LOCKS, &bytes)?)),
        None => Ok(None),
    }
}

fn write(trail: &Trail<'_>, record: &LockRecord) -> Result<(), FsError> {
    trail.note_write();
    trail.locks.insert(path_key(&record.path), encode(record)?)?;
    trail
        .locks
        .insert(token_key(&record.token), record.path.as_bytes())?;
    Ok(())
}

fn erase(trail: &Trail<'_>, record: &LockRecord) -> Result<(), FsError> {
    trail.note_write();
    trail.locks.remove(path_key(&record.path))?;
    trail.locks.remove(token_key(&record.token))?;
    Ok(())
}

impl LockProvider {
    /// Take the lock on `path` for `owner`.
    ///
    /// Fails with [`FsError::PathLocked`] while another live lock holds the
    /// path.
    pub fn create_lock(
        &self,
        path: &str,
        owner: &str,
        comment: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> Result<LockRecord, FsError> {
        let path = canonical(path)?;
        let record = self.fs.with_trail(|trail| {
            let now = Utc::now();
            if let Some(existing) = read_any(trail, &path)? {
                if !existing.is_expired(now) {
                    return Err(FsError::PathLocked {
                        path: path.clone(),
                        owner: existing.owner,
                    });
                }
                debug!(path = %path, token = %existing.token, "Replacing expired lock");
                erase(trail, &existing)?;
            }
            let counter = next_counter(trail.meta, NEXT_LOCK_KEY, 0)?;
            let record = LockRecord {
                token: LockToken::generate(&path, owner, counter, now),
                path: path.clone(),
                owner: owner.to_string(),
                comment: comment.map(str::to_string),
                created: now,
                expires,
            };
            write(trail, &record)?;
            Ok(record)
        })?;
        info!(path = %record.path, owner = %record.owner, token = %record.token, "Created lock");
        Ok(record)
    }

    /// Live lock on `path`.
    pub fn get_lock(&self, path: &str) -> Result<Option<LockRecord>, FsError> {
        let path = canonical(path)?;
        self.fs
            .with_trail(|trail| read_live(trail, &path, Utc::now()))
    }

    pub fn has_lock(&self, path: &str) -> Result<bool, FsError> {
        Ok(self.get_lock(path)?.is_some())
    }

    /// Live lock on `path` if it carries `token`.
    pub fn find_lock(&self, path: &str, token: &LockToken) -> Result<Option<LockRecord>, FsError> {
        Ok(self
            .get_lock(path)?
            .filter(|record| &record.token == token))
    }

    /// Move the expiry of the lock on `path`; the token is kept.
    pub fn refresh_lock(
        &self,
        path: &str,
        token: &LockToken,
        expires: Option<DateTime<Utc>>,
    ) -> Result<LockRecord, FsError> {
        let path = canonical(path)?;
        // Absence is reported after the trail so an expired record's erasure commits.
        self.fs
            .with_trail(|trail| {
                let Some(mut record) = read_live(trail, &path, Utc::now())? else {
                    return Ok(None);
                };
                if &record.token != token {
                    return Err(FsError::LockTokenMismatch(path.clone()));
                }
                record.expires = expires;
                write(trail, &record)?;
                Ok(Some(record))
            })?
            .ok_or_else(|| FsError::LockNotFound(path.clone()))
    }

    /// Release the lock on `path`. With a token it must match the lock's;
    /// without one the lock is broken.
    pub fn remove_lock(&self, path: &str, token: Option<&LockToken>) -> Result<(), FsError> {
        let path = canonical(path)?;
        let removed = self
            .fs
            .with_trail(|trail| {
                let Some(record) = read_live(trail, &path, Utc::now())? else {
                    return Ok(None);
                };
                if let Some(token) = token {
                    if &record.token != token {
                        return Err(FsError::LockTokenMismatch(path.clone()));
                    }
                }
                erase(trail, &record)?;
                Ok(Some(record))
            })?
            .ok_or_else(|| FsError::LockNotFound(path.clone()))?;
        info!(
            path = %removed.path,
            token = %removed.token,
            broken = token.is_none(),
            "Removed lock"
        );
        Ok(())
    }

    /// Path locked by `token`.
    pub fn lookup_token(&self, token: &LockToken) -> Result<String, FsError> {
        self.fs
            .with_trail(|trail| {
                let path = match trail.locks.get(token_key(token))? {
                    Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    None => return Ok(None),
                };
                match read_live(trail, &path, Utc::now())? {
                    Some(record) if &record.token == token => Ok(Some(path)),
                    _ => {
                        // Dangling token entry
                        trail.note_write();
                        trail.locks.remove(token_key(token))?;
                        Ok(None)
                    }
                }
            })?
            .ok_or_else(|| FsError::LockNotFound(token.to_string()))
    }
}

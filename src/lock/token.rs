//! Opaque lock tokens.

use crate::error::FsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "opaquelocktoken:";
const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Token identifying one lock, `opaquelocktoken:xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
///
/// Tokens only compare for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockToken(String);

impl LockToken {
    /// Derive a fresh token from the lock's identity and a store-wide counter.
    pub(crate) fn generate(path: &str, owner: &str, counter: u64, now: DateTime<Utc>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(owner.as_bytes());
        hasher.update(&[0]);
        hasher.update(&counter.to_be_bytes());
        hasher.update(&now.timestamp().to_be_bytes());
        hasher.update(&now.timestamp_subsec_nanos().to_be_bytes());
        let digest = hasher.finalize();
        let hex = hex::encode(&digest.as_bytes()[..16]);

        let mut token = String::from(PREFIX);
        let mut offset = 0;
        for (i, len) in GROUPS.iter().enumerate() {
            if i > 0 {
                token.push('-');
            }
            token.push_str(&hex[offset..offset + len]);
            offset += len;
        }
        LockToken(token)
    }

    /// Parse the textual form. Hex digits are accepted in either case.
    pub fn parse(s: &str) -> Result<Self, FsError> {
        let invalid = || FsError::InvalidLockToken(s.to_string());
        let body = s.strip_prefix(PREFIX).ok_or_else(invalid)?;
        let groups: Vec<&str> = body.split('-').collect();
        if groups.len() != GROUPS.len() {
            return Err(invalid());
        }
        for (group, len) in groups.iter().zip(GROUPS) {
            if group.len() != len || !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid());
            }
        }
        Ok(LockToken(format!("{}{}", PREFIX, body.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LockToken {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockToken::parse(s)
    }
}

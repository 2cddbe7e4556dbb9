//! Core identifier types for the versioned tree store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of one node-revision.
///
/// `lineage` names the node across its whole history; `copy` distinguishes the
/// successive node-revisions of that lineage. Two ids with the same lineage are
/// related but only equal when both parts match. Ids carry no ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    lineage: u64,
    copy: u64,
}

impl NodeId {
    /// Root directory of revision 0.
    pub const ROOT: NodeId = NodeId { lineage: 0, copy: 0 };

    pub fn new(lineage: u64, copy: u64) -> Self {
        Self { lineage, copy }
    }

    pub fn lineage(&self) -> u64 {
        self.lineage
    }

    pub fn copy(&self) -> u64 {
        self.copy
    }

    /// True if both ids describe revisions of the same node.
    pub fn is_related(&self, other: &NodeId) -> bool {
        self.lineage == other.lineage
    }

    /// Fixed-width key used by the `nodes` table.
    pub fn to_key(&self) -> [u8; 16] {
        let mut key = [0u8; 16];
        key[..8].copy_from_slice(&self.lineage.to_be_bytes());
        key[8..].copy_from_slice(&self.copy.to_be_bytes());
        key
    }

    pub fn from_key(key: &[u8]) -> Option<Self> {
        if key.len() != 16 {
            return None;
        }
        let mut lineage = [0u8; 8];
        let mut copy = [0u8; 8];
        lineage.copy_from_slice(&key[..8]);
        copy.copy_from_slice(&key[8..]);
        Some(Self {
            lineage: u64::from_be_bytes(lineage),
            copy: u64::from_be_bytes(copy),
        })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.lineage, self.copy)
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lineage, copy) = s
            .split_once('.')
            .ok_or_else(|| format!("malformed node id: {}", s))?;
        let lineage = lineage
            .parse()
            .map_err(|_| format!("malformed node lineage: {}", s))?;
        let copy = copy
            .parse()
            .map_err(|_| format!("malformed node copy: {}", s))?;
        Ok(Self { lineage, copy })
    }
}

/// Revision number. Totally ordered; revision 0 is the empty tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Revnum(u64);

impl Revnum {
    pub const ZERO: Revnum = Revnum(0);

    pub fn new(n: u64) -> Self {
        Revnum(n)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Revnum {
        Revnum(self.0 + 1)
    }

    /// Big-endian key so the `revisions` table iterates in order.
    pub fn to_key(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Revnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Revnum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('r').unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Revnum)
            .map_err(|_| format!("malformed revision number: {}", s))
    }
}

/// Durable name of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnName(String);

impl TxnName {
    pub fn new(name: impl Into<String>) -> Self {
        TxnName(name.into())
    }

    /// Base-36 name for the `n`th transaction ever begun.
    pub fn from_counter(mut n: u64) -> Self {
        const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut buf = Vec::new();
        loop {
            buf.push(DIGITS[(n % 36) as usize]);
            n /= 36;
            if n == 0 {
                break;
            }
        }
        buf.reverse();
        TxnName(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-addressed handle of a file blob (blake3 of the bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef(pub [u8; 32]);

impl ContentRef {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

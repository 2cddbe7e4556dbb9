//! Arbor: Transactional Versioned Tree Store
//!
//! A filesystem-like repository whose history is an append-only sequence of
//! immutable revisions. Each revision is a tree of versioned nodes that shares
//! every unchanged subtree with its predecessor. Changes are staged in
//! transactions that copy nodes on write and become the next revision
//! atomically on commit. Every access to the underlying sled database runs in
//! a retried atomic unit (a [`trail::Trail`]).

pub mod config;
pub mod error;
pub mod fs;
pub mod lock;
pub mod logging;
pub mod revision;
pub mod store;
pub mod tooling;
pub mod trail;
pub mod tree;
pub mod txn;
pub mod types;

pub use error::{FsError, StorageError};
pub use fs::Filesystem;
pub use lock::{LockProvider, LockRecord, LockToken};
pub use revision::{RevisionRecord, RevisionRoot, RevisionSpec};
pub use store::{NodeKind, NodeRevision};
pub use trail::{Trail, TrailStats};
pub use txn::{Transaction, TransactionRecord};
pub use types::{ContentRef, NodeId, Revnum, TxnName};

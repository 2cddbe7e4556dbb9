//! Error types for the store and its public operations.

use crate::types::{NodeId, Revnum};
use sled::transaction::UnabortableTransactionError;
use thiserror::Error;

/// Failures of the storage engine or of record decoding.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Corrupt record in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

/// Errors surfaced by filesystem, transaction, revision and lock operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("Node revision not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Revision not found: {0}")]
    RevisionNotFound(Revnum),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("No lock on path: {0}")]
    LockNotFound(String),

    #[error("Node revision {0} is immutable")]
    MutabilityViolation(NodeId),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Backend write/write conflict. Retried inside the trail, never returned
    /// from a public operation.
    #[error("Transient backend conflict")]
    TransientConflict,

    #[error("Gave up after {attempts} conflicting attempts")]
    ConflictLimitExceeded { attempts: u32 },

    #[error("Storage failure: {0}")]
    BackendFailure(#[from] StorageError),

    #[error("Mutually exclusive arguments: {0}")]
    MutuallyExclusiveArguments(String),

    #[error("Path {path} is locked by {owner}")]
    PathLocked { path: String, owner: String },

    #[error("Lock token does not match lock on {0}")]
    LockTokenMismatch(String),

    #[error("Invalid lock token: {0}")]
    InvalidLockToken(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Local filesystem failure outside the store, e.g. reading an import source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FsError::NodeNotFound(_)
                | FsError::TransactionNotFound(_)
                | FsError::RevisionNotFound(_)
                | FsError::PathNotFound(_)
                | FsError::LockNotFound(_)
        )
    }
}

impl From<UnabortableTransactionError> for FsError {
    fn from(err: UnabortableTransactionError) -> Self {
        match err {
            UnabortableTransactionError::Conflict => FsError::TransientConflict,
            UnabortableTransactionError::Storage(e) => {
                FsError::BackendFailure(StorageError::Backend(e))
            }
        }
    }
}

impl From<sled::Error> for FsError {
    fn from(err: sled::Error) -> Self {
        FsError::BackendFailure(StorageError::Backend(err))
    }
}

impl From<bincode::Error> for FsError {
    fn from(err: bincode::Error) -> Self {
        FsError::BackendFailure(StorageError::Codec(err))
    }
}

impl From<config::ConfigError> for FsError {
    fn from(err: config::ConfigError) -> Self {
        FsError::ConfigError(err.to_string())
    }
}

//! Trails: retryable atomic units of backend work.
//!
//! Every read or write of the store happens inside a trail. A trail opens one
//! sled transaction spanning all tables, runs a body against it and commits.
//! When the backend reports a conflict the whole body is discarded and run
//! again from scratch with a fresh [`Trail`], so bodies must not have effects
//! outside the trail until it succeeds. Effects that should only happen after
//! a successful commit are registered with [`Trail::on_commit`].

use crate::config::TrailConfig;
use crate::error::{FsError, StorageError};
use crate::store::persistence::Tables;
use crate::types::NodeId;
use parking_lot::RwLock;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::Transactional;
use std::cell::Cell;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Cumulative trail statistics for one filesystem handle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrailStats {
    /// Units that committed
    pub committed: u64,
    /// Units that failed with a non-transient error
    pub failed: u64,
    /// Attempts discarded because of a conflict
    pub retries: u64,
}

/// One attempt at running a unit of work.
///
/// Owns the per-attempt arena: the transactional table views, the set of nodes
/// visited by recursive walks, operation counters and deferred hooks. All of it
/// is dropped when the attempt ends, whatever the outcome.
pub struct Trail<'a> {
    pub(crate) nodes: &'a TransactionalTree,
    pub(crate) revisions: &'a TransactionalTree,
    pub(crate) transactions: &'a TransactionalTree,
    pub(crate) strings: &'a TransactionalTree,
    pub(crate) locks: &'a TransactionalTree,
    pub(crate) meta: &'a TransactionalTree,
    attempt: u32,
    visited: HashSet<NodeId>,
    reads: Cell<u32>,
    writes: Cell<u32>,
    deferred: Vec<Box<dyn FnOnce()>>,
}

impl<'a> Trail<'a> {
    /// Which attempt this is, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Run `hook` once the unit has committed. Hooks of discarded attempts are
    /// dropped without running.
    pub fn on_commit(&mut self, hook: impl FnOnce() + 'static) {
        self.deferred.push(Box::new(hook));
    }

    /// Record a visit of `id`; false if it was already visited in this attempt.
    pub(crate) fn first_visit(&mut self, id: NodeId) -> bool {
        self.visited.insert(id)
    }

    pub(crate) fn note_read(&self) {
        self.reads.set(self.reads.get() + 1);
    }

    pub(crate) fn note_write(&self) {
        self.writes.set(self.writes.get() + 1);
    }
}

/// Run `body` as one atomic unit against `tables`, retrying on conflicts.
///
/// Conflicts detected by sled at commit time and [`FsError::TransientConflict`]
/// returned by the body both restart the body. After `config.max_attempts`
/// attempts the unit fails with [`FsError::ConflictLimitExceeded`]. Any other
/// error aborts the backend transaction and is returned unchanged.
pub(crate) fn retry_txn<T, F>(
    tables: &Tables,
    config: &TrailConfig,
    stats: &RwLock<TrailStats>,
    body: F,
) -> Result<T, FsError>
where
    F: Fn(&mut Trail<'_>) -> Result<T, FsError>,
{
    let max_attempts = config.max_attempts.max(1);
    let attempts = Cell::new(0u32);

    loop {
        let outcome = (
            &tables.nodes,
            &tables.revisions,
            &tables.transactions,
            &tables.strings,
            &tables.locks,
            &tables.meta,
        )
            .transaction(|(nodes, revisions, transactions, strings, locks, meta)| {
                let attempt = attempts.get() + 1;
                attempts.set(attempt);
                if attempt > max_attempts {
                    return Err(ConflictableTransactionError::Abort(
                        FsError::ConflictLimitExceeded {
                            attempts: max_attempts,
                        },
                    ));
                }
                if attempt > 1 {
                    stats.write().retries += 1;
                }

                let mut trail = Trail {
                    nodes,
                    revisions,
                    transactions,
                    strings,
                    locks,
                    meta,
                    attempt,
                    visited: HashSet::new(),
                    reads: Cell::new(0),
                    writes: Cell::new(0),
                    deferred: Vec::new(),
                };
                let value = body(&mut trail).map_err(ConflictableTransactionError::Abort)?;
                debug!(
                    attempt,
                    reads = trail.reads.get(),
                    writes = trail.writes.get(),
                    "Trail body finished"
                );
                Ok((value, trail.deferred))
            });

        match outcome {
            Ok((value, deferred)) => {
                stats.write().committed += 1;
                for hook in deferred {
                    hook();
                }
                return Ok(value);
            }
            Err(TransactionError::Abort(FsError::TransientConflict)) => {
                let attempt = attempts.get();
                if attempt >= max_attempts {
                    warn!(attempts = attempt, "Trail exceeded conflict retry limit");
                    stats.write().failed += 1;
                    return Err(FsError::ConflictLimitExceeded {
                        attempts: max_attempts,
                    });
                }
                debug!(attempt, "Trail conflicted, retrying");
                if config.backoff_ms > 0 {
                    std::thread::sleep(Duration::from_millis(
                        config.backoff_ms * u64::from(attempt),
                    ));
                }
            }
            Err(TransactionError::Abort(err)) => {
                stats.write().failed += 1;
                return Err(err);
            }
            Err(TransactionError::Storage(err)) => {
                stats.write().failed += 1;
                return Err(FsError::BackendFailure(StorageError::Backend(err)));
            }
        }
    }
}

//! Filesystem handle
//!
//! A [`Filesystem`] binds one sled database and is the context every
//! operation runs against. Clones share the same database; the database is
//! released when the last clone is dropped.

use crate::config::{ArborConfig, TrailConfig};
use crate::error::FsError;
use crate::revision::table as revision_table;
use crate::store::persistence::{Tables, YOUNGEST_KEY};
use crate::store::{NodeRevision, NodeRevisionStore};
use crate::trail::{retry_txn, Trail, TrailStats};
use crate::types::NodeId;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Attempts at acquiring the database directory lock.
const OPEN_ATTEMPTS: u32 = 20;
const OPEN_BACKOFF_MS: u64 = 10;

/// Open the database, waiting out a lock still held by a handle that was just
/// dropped; sled releases it from its flusher thread.
fn open_db(config: &sled::Config) -> Result<sled::Db, FsError> {
    let mut attempt = 1;
    loop {
        match config.open() {
            Ok(db) => return Ok(db),
            Err(sled::Error::Io(e))
                if e.kind() == std::io::ErrorKind::WouldBlock && attempt < OPEN_ATTEMPTS =>
            {
                debug!(attempt, "Database directory is locked, retrying");
                std::thread::sleep(Duration::from_millis(OPEN_BACKOFF_MS * u64::from(attempt)));
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

struct FsInner {
    tables: Tables,
    trail_config: TrailConfig,
    stats: RwLock<TrailStats>,
    path: Option<PathBuf>,
}

/// Handle to an open store.
#[derive(Clone)]
pub struct Filesystem {
    inner: Arc<FsInner>,
}

impl std::fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filesystem")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

impl Filesystem {
    /// Create a new store: an empty root directory `0.0` as revision 0.
    ///
    /// Fails with [`FsError::AlreadyExists`] if the database already holds a
    /// store.
    pub fn create(config: &ArborConfig) -> Result<Self, FsError> {
        let fs = Self::open_tables(config)?;
        if fs.is_initialised()? {
            return Err(FsError::AlreadyExists(fs.display_path()));
        }

        fs.initialise()?;
        fs.flush()?;
        Ok(fs)
    }

    /// Open an existing store.
    pub fn open(config: &ArborConfig) -> Result<Self, FsError> {
        let fs = Self::open_tables(config)?;
        if !fs.is_initialised()? {
            return Err(FsError::PathNotFound(format!(
                "no store at {}",
                fs.display_path()
            )));
        }
        info!(path = %fs.display_path(), "Opened store");
        Ok(fs)
    }

    /// Open the store, creating it first if the database is empty.
    pub fn open_or_create(config: &ArborConfig) -> Result<Self, FsError> {
        let fs = Self::open_tables(config)?;
        if fs.is_initialised()? {
            return Ok(fs);
        }
        fs.initialise()?;
        Ok(fs)
    }

    fn open_tables(config: &ArborConfig) -> Result<Self, FsError> {
        let sled_config = config.storage.sled_config()?;
        let path = if config.storage.temporary {
            None
        } else {
            Some(config.storage.resolve_path()?)
        };
        if let Some(dir) = &path {
            std::fs::create_dir_all(dir).map_err(crate::error::StorageError::from)?;
        }
        debug!(path = ?path, "Opening database");
        let db = open_db(&sled_config)?;
        Ok(Self {
            inner: Arc::new(FsInner {
                tables: Tables::open(db)?,
                trail_config: config.trail.clone(),
                stats: RwLock::new(TrailStats::default()),
                path,
            }),
        })
    }

    fn initialise(&self) -> Result<(), FsError> {
        self.with_trail(|trail| {
            trail.put_node(&NodeId::ROOT, &NodeRevision::new_directory(None))?;
            revision_table::init(trail, NodeId::ROOT)
        })?;
        info!(path = %self.display_path(), "Created store");
        Ok(())
    }

    fn is_initialised(&self) -> Result<bool, FsError> {
        Ok(self.inner.tables.meta.contains_key(YOUNGEST_KEY)?)
    }

    fn display_path(&self) -> String {
        match &self.inner.path {
            Some(path) => path.display().to_string(),
            None => "<temporary>".to_string(),
        }
    }

    /// Database directory, `None` for a temporary store.
    pub fn path(&self) -> Option<&std::path::Path> {
        self.inner.path.as_deref()
    }

    /// Run `body` as one atomic, retried unit of work.
    ///
    /// `body` may run several times and must not have effects outside the
    /// trail; register those with [`Trail::on_commit`].
    pub fn with_trail<T, F>(&self, body: F) -> Result<T, FsError>
    where
        F: Fn(&mut Trail<'_>) -> Result<T, FsError>,
    {
        retry_txn(
            &self.inner.tables,
            &self.inner.trail_config,
            &self.inner.stats,
            body,
        )
    }

    pub fn trail_config(&self) -> &TrailConfig {
        &self.inner.trail_config
    }

    /// Snapshot of the unit counters.
    pub fn trail_stats(&self) -> TrailStats {
        self.inner.stats.read().clone()
    }

    /// Raw node-revision record.
    pub fn node_revision(&self, id: NodeId) -> Result<NodeRevision, FsError> {
        self.with_trail(|trail| trail.get_node(&id))
    }

    /// Number of node-revision records, read outside any unit.
    pub fn node_revision_count(&self) -> usize {
        self.inner.tables.nodes.len()
    }

    /// Number of stored content blobs.
    pub fn blob_count(&self) -> usize {
        self.inner.tables.strings.len()
    }

    /// Flush to disk, returning the number of bytes written.
    pub fn flush(&self) -> Result<usize, FsError> {
        Ok(self.inner.tables.flush()?)
    }
}

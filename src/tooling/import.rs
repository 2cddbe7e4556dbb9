//! Directory import
//!
//! Copies a local directory tree into a new revision. The import runs in one
//! transaction; any failure aborts it so the store is left unchanged.

use crate::error::FsError;
use crate::fs::Filesystem;
use crate::store::NodeKind;
use crate::tree::path::{join_path, split_path};
use crate::txn::Transaction;
use crate::types::Revnum;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub revision: Revnum,
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
    /// Entries that were neither files nor directories
    pub skipped: Vec<PathBuf>,
}

/// Import `source` below `prefix` (the root when `None`) as one new revision.
/// `message` is recorded as the revision's `log` property.
pub fn import_directory(
    fs: &Filesystem,
    source: &Path,
    prefix: Option<&str>,
    message: Option<&str>,
) -> Result<ImportSummary, FsError> {
    let source = dunce::canonicalize(source)?;
    if !source.is_dir() {
        return Err(FsError::NotADirectory(source.display().to_string()));
    }

    let txn = fs.begin_txn(fs.youngest_rev()?)?;
    match populate(&txn, &source, prefix, message) {
        Ok(mut summary) => {
            summary.revision = txn.commit()?;
            info!(
                source = %source.display(),
                rev = %summary.revision,
                files = summary.files,
                directories = summary.directories,
                "Imported directory"
            );
            Ok(summary)
        }
        Err(e) => {
            warn!(source = %source.display(), error = %e, "Import failed, aborting transaction");
            Err(abandon(&txn, e))
        }
    }
}

/// Abort `txn` after `err`; an abort failure is logged and `err` returned.
fn abandon(txn: &Transaction, err: FsError) -> FsError {
    if let Err(abort_err) = txn.abort() {
        warn!(txn = %txn.name(), error = %abort_err, "Failed to abort import transaction");
    }
    err
}

fn populate(
    txn: &Transaction,
    source: &Path,
    prefix: Option<&str>,
    message: Option<&str>,
) -> Result<ImportSummary, FsError> {
    if let Some(message) = message {
        txn.set_prop("log", Some(message))?;
    }
    let base = ensure_prefix(txn, prefix.unwrap_or(""))?;

    let mut summary = ImportSummary {
        revision: Revnum::ZERO,
        files: 0,
        directories: 0,
        bytes: 0,
        skipped: Vec::new(),
    };
    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| {
            FsError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| FsError::InvalidPath(entry.path().display().to_string()))?;
        let mut components = base.clone();
        for part in relative.iter() {
            components.push(part.to_string_lossy().into_owned());
        }
        let target = join_path(&components);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            txn.make_dir(&target)?;
            summary.directories += 1;
        } else if file_type.is_file() {
            let bytes = std::fs::read(entry.path())?;
            txn.make_file(&target)?;
            txn.write_file(&target, &bytes)?;
            summary.files += 1;
            summary.bytes += bytes.len() as u64;
        } else {
            debug!(path = %entry.path().display(), "Skipping special file");
            summary.skipped.push(entry.path().to_path_buf());
            continue;
        }
        debug!(path = %target, "Imported entry");
    }
    Ok(summary)
}

/// Create any missing directories of `prefix`, returning its components.
fn ensure_prefix(txn: &Transaction, prefix: &str) -> Result<Vec<String>, FsError> {
    let components = split_path(prefix)?;
    for depth in 1..=components.len() {
        let path = join_path(&components[..depth]);
        match txn.node_kind(&path)? {
            Some(NodeKind::Directory) => {}
            Some(NodeKind::File) => return Err(FsError::NotADirectory(path)),
            None => {
                txn.make_dir(&path)?;
            }
        }
    }
    Ok(components)
}

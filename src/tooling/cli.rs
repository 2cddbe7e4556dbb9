//! CLI Tooling
//!
//! Administrative command-line interface over one store: creation, summary,
//! live transactions, revision browsing, directory import and locks.

use crate::config::{ArborConfig, ConfigLoader};
use crate::error::FsError;
use crate::fs::Filesystem;
use crate::lock::{LockRecord, LockToken};
use crate::revision::RevisionSpec;
use crate::store::NodeKind;
use crate::tooling::import::import_directory;
use crate::types::Revnum;
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use parking_lot::Mutex;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Arbor CLI - transactional versioned tree store
#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Inspect and administer an arbor store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory (overrides the configured path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new, empty store
    Init,
    /// Show a summary of the store
    Info {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect and abort live transactions
    Txn {
        #[command(subcommand)]
        command: TxnCommands,
    },
    /// Browse committed revisions
    Rev {
        #[command(subcommand)]
        command: RevCommands,
    },
    /// Commit a local directory tree as a new revision
    Import {
        /// Directory to import
        source: PathBuf,
        /// Store directory to import into (default: the root)
        #[arg(long)]
        prefix: Option<String>,
        /// Log message recorded on the revision
        #[arg(long, short = 'm')]
        message: Option<String>,
    },
    /// Manage path locks
    Lock {
        #[command(subcommand)]
        command: LockCommands,
    },
}

#[derive(Subcommand)]
pub enum TxnCommands {
    /// List live transactions
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one transaction
    Show {
        name: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Abort a transaction, deleting everything it created
    Abort {
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Revision selector shared by the `rev` commands
#[derive(Args, Debug, Clone, Default)]
pub struct RevisionArgs {
    /// Revision number (default: youngest)
    #[arg(long, short = 'r')]
    pub rev: Option<Revnum>,

    /// Youngest revision at or before this RFC 3339 instant
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

impl RevisionArgs {
    fn spec(&self) -> Result<RevisionSpec, FsError> {
        RevisionSpec::from_args(self.rev, self.at)
    }
}

#[derive(Subcommand)]
pub enum RevCommands {
    /// Show a revision record
    Show {
        #[command(flatten)]
        revision: RevisionArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
        #[command(flatten)]
        revision: RevisionArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print a file
    Cat {
        path: String,
        #[command(flatten)]
        revision: RevisionArgs,
    },
}

#[derive(Subcommand)]
pub enum LockCommands {
    /// Lock a path
    Create {
        path: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        comment: Option<String>,
        /// Lifetime in seconds (default: never expires)
        #[arg(long)]
        ttl: Option<i64>,
    },
    /// Show the lock on a path
    Show {
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Release a lock
    Remove {
        path: String,
        /// Token of the lock to release
        #[arg(long)]
        token: Option<String>,
        /// Break the lock without its token
        #[arg(long)]
        force: bool,
    },
}

/// CLI context for one store
///
/// The store is opened on first use and kept for the life of the context.
pub struct CliContext {
    config: ArborConfig,
    fs: Mutex<Option<Filesystem>>,
}

impl CliContext {
    /// Load configuration and apply the store override.
    pub fn new(store: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self, FsError> {
        let mut config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Some(store) = store {
            config.storage.path = Some(store);
            config.storage.temporary = false;
        }
        Ok(Self::with_config(config))
    }

    /// Context over an explicit configuration.
    pub fn with_config(config: ArborConfig) -> Self {
        Self {
            config,
            fs: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ArborConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ArborConfig {
        &mut self.config
    }

    /// The context's store, opened on first call.
    pub fn filesystem(&self) -> Result<Filesystem, FsError> {
        let mut slot = self.fs.lock();
        if let Some(fs) = slot.as_ref() {
            return Ok(fs.clone());
        }
        let fs = Filesystem::open(&self.config)?;
        *slot = Some(fs.clone());
        Ok(fs)
    }

    fn create(&self) -> Result<Filesystem, FsError> {
        let mut slot = self.fs.lock();
        if let Some(fs) = slot.as_ref() {
            return Err(FsError::AlreadyExists(display_path(fs)));
        }
        let fs = Filesystem::create(&self.config)?;
        *slot = Some(fs.clone());
        Ok(fs)
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, FsError> {
        match command {
            Commands::Init => {
                let fs = self.create()?;
                Ok(format!("Created store at {}", display_path(&fs)))
            }
            Commands::Info { format } => self.handle_info(format),
            Commands::Txn { command } => self.handle_txn_command(command),
            Commands::Rev { command } => self.handle_rev_command(command),
            Commands::Import {
                source,
                prefix,
                message,
            } => {
                let fs = self.filesystem()?;
                let summary =
                    import_directory(&fs, source, prefix.as_deref(), message.as_deref())?;
                let mut output = format!(
                    "Committed revision {} ({} files, {} directories, {} bytes)",
                    summary.revision, summary.files, summary.directories, summary.bytes
                );
                for skipped in &summary.skipped {
                    output.push_str(&format!("\nSkipped {}", skipped.display()));
                }
                Ok(output)
            }
            Commands::Lock { command } => self.handle_lock_command(command),
        }
    }

    fn handle_info(&self, format: &str) -> Result<String, FsError> {
        let fs = self.filesystem()?;
        let youngest = fs.youngest_rev()?;
        let transactions = fs.list_transactions()?;
        let stats = fs.trail_stats();
        let path = display_path(&fs);

        if format == "json" {
            return to_json(json!({
                "path": path,
                "youngest": youngest.as_u64(),
                "transactions": transactions.len(),
                "node_revisions": fs.node_revision_count(),
                "blobs": fs.blob_count(),
                "units": { "committed": stats.committed, "failed": stats.failed, "retries": stats.retries },
            }));
        }
        let mut table = new_table(vec!["Property", "Value"]);
        table.add_row(vec!["Path".to_string(), path]);
        table.add_row(vec!["Youngest revision".to_string(), youngest.to_string()]);
        table.add_row(vec!["Live transactions".to_string(), transactions.len().to_string()]);
        table.add_row(vec![
            "Node revisions".to_string(),
            fs.node_revision_count().to_string(),
        ]);
        table.add_row(vec!["Content blobs".to_string(), fs.blob_count().to_string()]);
        Ok(table.to_string())
    }

    fn handle_txn_command(&self, command: &TxnCommands) -> Result<String, FsError> {
        let fs = self.filesystem()?;
        match command {
            TxnCommands::List { format } => {
                let mut rows = Vec::new();
                for name in fs.list_transactions()? {
                    let record = fs.open_txn(name.as_str())?.record()?;
                    rows.push((name, record));
                }
                if format == "json" {
                    let arr: Vec<serde_json::Value> = rows
                        .iter()
                        .map(|(name, record)| {
                            json!({
                                "name": name.as_str(),
                                "base_rev": record.base_rev.as_u64(),
                                "root": record.root.to_string(),
                                "created": record.created.to_rfc3339(),
                            })
                        })
                        .collect();
                    return to_json(json!(arr));
                }
                if rows.is_empty() {
                    return Ok("No live transactions".to_string());
                }
                let mut table = new_table(vec!["Name", "Base", "Root", "Created"]);
                for (name, record) in &rows {
                    table.add_row(vec![
                        name.to_string(),
                        record.base_rev.to_string(),
                        record.root.to_string(),
                        record.created.to_rfc3339(),
                    ]);
                }
                Ok(table.to_string())
            }
            TxnCommands::Show { name, format } => {
                let txn = fs.open_txn(name)?;
                let record = txn.record()?;
                if format == "json" {
                    return to_json(json!({
                        "name": name,
                        "base_rev": record.base_rev.as_u64(),
                        "base_root": record.base_root.to_string(),
                        "root": record.root.to_string(),
                        "created": record.created.to_rfc3339(),
                        "props": record.props,
                    }));
                }
                let mut output = format!(
                    "Transaction {}\n  base revision: {}\n  root: {} (base {})\n  created: {}",
                    name,
                    record.base_rev,
                    record.root,
                    record.base_root,
                    record.created.to_rfc3339()
                );
                for (key, value) in &record.props {
                    output.push_str(&format!("\n  {} = {}", key, value));
                }
                Ok(output)
            }
            TxnCommands::Abort { name, yes } => {
                let txn = fs.open_txn(name)?;
                if !yes {
                    use dialoguer::Confirm;
                    let confirmed = Confirm::new()
                        .with_prompt(format!("Abort transaction '{}'?", name))
                        .interact()
                        .map_err(|e| {
                            FsError::ConfigError(format!("Failed to get user input: {}", e))
                        })?;
                    if !confirmed {
                        return Ok("Abort cancelled".to_string());
                    }
                }
                txn.abort()?;
                info!(txn = %name, "Transaction aborted from CLI");
                Ok(format!("Aborted transaction {}", name))
            }
        }
    }

    fn handle_rev_command(&self, command: &RevCommands) -> Result<String, FsError> {
        let fs = self.filesystem()?;
        match command {
            RevCommands::Show { revision, format } => {
                let rev = fs.resolve_revision(revision.spec()?)?;
                let record = fs.revision(rev)?;
                if format == "json" {
                    return to_json(json!({
                        "revision": rev.as_u64(),
                        "root": record.root.to_string(),
                        "date": record.date.to_rfc3339(),
                        "txn": record.txn.as_ref().map(|t| t.to_string()),
                        "props": record.props,
                    }));
                }
                let mut output = format!(
                    "Revision {}\n  date: {}\n  root: {}",
                    rev,
                    record.date.to_rfc3339(),
                    record.root
                );
                for (key, value) in &record.props {
                    output.push_str(&format!("\n  {} = {}", key, value));
                }
                Ok(output)
            }
            RevCommands::Ls {
                path,
                revision,
                format,
            } => {
                let rev = fs.resolve_revision(revision.spec()?)?;
                let root = fs.revision_root(rev)?;
                let mut rows = Vec::new();
                for (name, id) in root.dir_entries(path)? {
                    let kind = fs.node_revision(id)?.kind();
                    rows.push((name, id, kind));
                }
                if format == "json" {
                    let arr: Vec<serde_json::Value> = rows
                        .iter()
                        .map(|(name, id, kind)| {
                            json!({
                                "name": name,
                                "node": id.to_string(),
                                "kind": kind_label(*kind),
                            })
                        })
                        .collect();
                    return to_json(json!(arr));
                }
                let mut table = new_table(vec!["Name", "Kind", "Node"]);
                for (name, id, kind) in &rows {
                    table.add_row(vec![
                        name.clone(),
                        kind_label(*kind).to_string(),
                        id.to_string(),
                    ]);
                }
                Ok(table.to_string())
            }
            RevCommands::Cat { path, revision } => {
                let rev = fs.resolve_revision(revision.spec()?)?;
                let bytes = fs.revision_root(rev)?.file_contents(path)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }

    fn handle_lock_command(&self, command: &LockCommands) -> Result<String, FsError> {
        let locks = self.filesystem()?.locks();
        match command {
            LockCommands::Create {
                path,
                owner,
                comment,
                ttl,
            } => {
                let expires = ttl.map(|secs| Utc::now() + Duration::seconds(secs));
                let lock = locks.create_lock(path, owner, comment.as_deref(), expires)?;
                Ok(format!("Locked {} ({})", lock.path, lock.token))
            }
            LockCommands::Show { path, format } => {
                let lock = locks.get_lock(path)?;
                if format == "json" {
                    return to_json(match &lock {
                        Some(lock) => lock_json(lock),
                        None => serde_json::Value::Null,
                    });
                }
                Ok(match lock {
                    Some(lock) => format_lock(&lock),
                    None => format!("{} is not locked", path),
                })
            }
            LockCommands::Remove { path, token, force } => {
                let token = token.as_deref().map(LockToken::parse).transpose()?;
                if token.is_none() && !force {
                    return Err(FsError::InvalidLockToken(
                        "a token is required unless --force is given".to_string(),
                    ));
                }
                locks.remove_lock(path, token.as_ref())?;
                Ok(format!("Unlocked {}", path))
            }
        }
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(header);
    table
}

fn to_json(value: serde_json::Value) -> Result<String, FsError> {
    Ok(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Directory => "dir",
        NodeKind::File => "file",
    }
}

fn display_path(fs: &Filesystem) -> String {
    fs.path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<temporary>".to_string())
}

fn lock_json(lock: &LockRecord) -> serde_json::Value {
    json!({
        "path": lock.path,
        "token": lock.token.as_str(),
        "owner": lock.owner,
        "comment": lock.comment,
        "created": lock.created.to_rfc3339(),
        "expires": lock.expires.map(|t| t.to_rfc3339()),
    })
}

fn format_lock(lock: &LockRecord) -> String {
    let mut output = format!(
        "Lock on {}\n  token: {}\n  owner: {}\n  created: {}",
        lock.path,
        lock.token,
        lock.owner,
        lock.created.to_rfc3339()
    );
    if let Some(expires) = lock.expires {
        output.push_str(&format!("\n  expires: {}", expires.to_rfc3339()));
    }
    if let Some(comment) = &lock.comment {
        output.push_str(&format!("\n  comment: {}", comment));
    }
    output
}

//! Tooling Layer
//!
//! Command-line administration and directory import for arbor stores.

pub mod cli;
pub mod import;

pub use cli::{Cli, CliContext, Commands};
pub use import::{import_directory, ImportSummary};

//! Integration tests for the arbor transactional tree store

mod abort_cleanup;
mod cli_contracts;
mod concurrency;
mod immutability;
mod lifecycle;
mod locks;
mod properties;
mod scenario;
mod support;

//! Merge policy and the service applying it.

mod policy;
pub mod service;

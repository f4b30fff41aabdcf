//! `TaskZenith` task server library.
//!
//! Exposes the REST task store for use in tests and embedding.

pub mod config;
pub mod server;
pub mod store;

//! `TaskZenith` kanban board client library.

pub mod board;
pub mod config;
pub mod render;
pub mod store;

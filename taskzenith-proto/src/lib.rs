//! Shared wire definitions for the `TaskZenith` task store API.

pub mod api;
pub mod codec;
pub mod project;
pub mod task;

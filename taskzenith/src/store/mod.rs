//! Task store abstraction for `TaskZenith`.
//!
//! Defines the [`TaskStore`] trait the board synchronizer persists through.
//! Concrete implementations:
//! - [`http::HttpTaskStore`]: REST client for `taskzenith-server`
//! - [`memory::InMemoryTaskStore`]: process-local store for tests and offline mode
//! - [`scripted::ScriptedTaskStore`]: calls answered by hand, for ordering tests

pub mod http;
pub mod memory;
pub mod scripted;

use taskzenith_proto::codec::CodecError;
use taskzenith_proto::task::{Task, TaskId, TaskPatch};

/// Errors that can occur while talking to a task store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request could not be delivered or the connection broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// The store answered with a non-success status.
    #[error("store returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the status reason.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The addressed task or project does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store refused the update (validation).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The store is unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Async interface to the remote task store.
///
/// The synchronizer only ever reads a full project snapshot and submits
/// partial updates; creation and deletion belong to the store. Stores are
/// moved into spawned tasks, hence the `'static` bound.
pub trait TaskStore: Send + Sync + 'static {
    /// Fetch every task of a project, in store-defined order.
    fn fetch_by_project(
        &self,
        project_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Apply a partial update and return the store's authoritative record.
    ///
    /// Implementations MUST accept a patch carrying only `status`.
    fn update(
        &self,
        task_id: &TaskId,
        patch: &TaskPatch,
    ) -> impl std::future::Future<Output = Result<Task, StoreError>> + Send;
}

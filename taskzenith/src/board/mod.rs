//! Kanban board synchronization for `TaskZenith` projects.
//!
//! The board is a projection of one project's tasks into four fixed status
//! columns. Moves are applied optimistically, persisted through a
//! [`TaskStore`](crate::store::TaskStore), and rolled back if the store
//! rejects them.
//!
//! - [`columns`]: the column partition and its mutations
//! - [`state`]: the synchronous state machine (move log, rollback, stale-load guard)
//! - [`sync`]: the async actor that owns the state and talks to the store

pub mod columns;
pub mod state;
pub mod sync;

pub use columns::{Column, Columns};
pub use state::{Board, MoveId};
pub use sync::{
    BoardEvent, BoardHandle, BoardSynchronizer, BoardView, MoveTicket, Notice, SyncConfig,
};

use taskzenith_proto::task::{Task, TaskId};

use crate::store::StoreError;

/// Errors surfaced to callers of the board operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The task list could not be fetched; the previous board is kept.
    #[error("failed to fetch tasks for project {project_id}: {source}")]
    FetchFailed {
        /// Project that was being loaded.
        project_id: String,
        /// Underlying store error.
        source: StoreError,
    },

    /// A move could not be persisted and was reverted.
    #[error("failed to persist move of task {task_id}: {source}")]
    UpdateFailed {
        /// Task whose move was reverted.
        task_id: TaskId,
        /// Underlying store error.
        source: StoreError,
    },

    /// The synchronizer has shut down.
    #[error("board synchronizer is closed")]
    Closed,
}

/// Result of a `load` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched tasks replaced the board.
    Applied {
        /// Number of tasks placed on the board.
        task_count: usize,
        /// Tasks dropped because their status is not a board stage.
        dropped: Vec<TaskId>,
    },
    /// A later `load` was issued before this one resolved; its result was discarded.
    Superseded,
}

/// Result of a `move_task` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The store accepted the move; carries its authoritative record.
    Committed(Task),
    /// The task was not on the board; nothing happened.
    NotFound,
}

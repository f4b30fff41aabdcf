//! Synchronous board state machine.
//!
//! [`Board`] holds everything the synchronizer knows about the viewed
//! project and is mutated only by the actor in [`super::sync`]. It never
//! talks to a store; callers feed it store results and dispatch the
//! [`PendingMove`]s it hands back.
//!
//! # Move log
//!
//! The visible board is always `base` with the move log replayed on top.
//! `base` is the last fetched snapshot with every pruned commit folded in.
//! Each log entry is one accepted move:
//!
//! - `InFlight`: applied optimistically, update sent to the store
//! - `Queued`: applied optimistically, waiting for an earlier move of the
//!   same task to resolve
//! - `Committed(record)`: accepted by the store, replays as its record
//!
//! Dropping a failed entry and replaying restores the board as it was right
//! before that move, with any later moves still applied. A fresh load
//! becomes the new `base` and keeps only unresolved entries.

use std::fmt;

use taskzenith_proto::task::{Task, TaskId, TaskStatus};

use super::LoadOutcome;
use super::columns::Columns;
use crate::store::StoreError;

/// Identifies one accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveId(u64);

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move-{}", self.0)
    }
}

/// Handed out by [`Board::begin_load`]; identifies one load call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    project_id: String,
}

impl LoadTicket {
    /// The project being loaded.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// A move whose update must be sent to the store now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    /// Log entry to resolve with the store's answer.
    pub move_id: MoveId,
    /// Task being moved.
    pub task_id: TaskId,
    /// Status to persist.
    pub target: TaskStatus,
}

/// What [`Board::begin_move`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveStart {
    /// The task is not on the board. Nothing changed.
    NotFound,
    /// Applied; the update should be dispatched.
    Dispatch(PendingMove),
    /// Applied; the update waits for an earlier move of the same task.
    Queued(MoveId),
}

/// What [`Board::fail_move`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailResolution {
    /// Task whose move was reverted.
    pub task_id: TaskId,
    /// Title of the task as it was shown before the revert, if still on the board.
    pub title: Option<String>,
    /// Queued move of the same task that is now due.
    pub next: Option<PendingMove>,
}

#[derive(Debug, Clone)]
enum EntryState {
    InFlight,
    Queued,
    Committed(Task),
}

#[derive(Debug, Clone)]
struct Entry {
    move_id: MoveId,
    task_id: TaskId,
    target: TaskStatus,
    state: EntryState,
}

impl Entry {
    const fn is_unresolved(&self) -> bool {
        !matches!(self.state, EntryState::Committed(_))
    }

    fn replay(&self, columns: &mut Columns) {
        match &self.state {
            EntryState::Committed(record) => {
                columns.apply_record(record.clone());
            }
            EntryState::InFlight | EntryState::Queued => {
                columns.move_task(&self.task_id, self.target);
            }
        }
    }
}

/// Board state of the viewed project.
#[derive(Debug, Default)]
pub struct Board {
    project_id: Option<String>,
    base: Columns,
    columns: Columns,
    log: Vec<Entry>,
    generation: u64,
    loading: bool,
    next_move: u64,
}

impl Board {
    /// Creates an empty board with no project loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current (optimistic) columns.
    #[must_use]
    pub const fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Project of the last applied load.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Whether the most recent load is still outstanding.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    /// Number of moves not yet confirmed by the store.
    #[must_use]
    pub fn pending_moves(&self) -> usize {
        self.log.iter().filter(|e| e.is_unresolved()).count()
    }

    /// Looks up a task in any column.
    #[must_use]
    pub fn select_task(&self, task_id: &TaskId) -> Option<&Task> {
        self.columns.task(task_id)
    }

    /// Starts a load. Any earlier outstanding load becomes stale.
    pub fn begin_load(&mut self, project_id: &str) -> LoadTicket {
        self.generation += 1;
        self.loading = true;
        LoadTicket {
            generation: self.generation,
            project_id: project_id.to_string(),
        }
    }

    /// Applies the result of a load.
    ///
    /// A ticket that is no longer the latest yields
    /// [`LoadOutcome::Superseded`] whatever the result, and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns the store error of a failed fetch; the board is kept as is.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Task>, StoreError>,
    ) -> Result<LoadOutcome, StoreError> {
        if ticket.generation != self.generation {
            return Ok(LoadOutcome::Superseded);
        }
        self.loading = false;
        let (base, dropped) = Columns::partition(result?);
        self.project_id = Some(ticket.project_id);
        self.base = base;
        // The fetch already reflects every move the store accepted.
        self.log.retain(Entry::is_unresolved);
        self.replay();
        Ok(LoadOutcome::Applied {
            task_count: self.base.len(),
            dropped,
        })
    }

    /// Applies a move optimistically and records it in the log.
    pub fn begin_move(&mut self, task_id: &TaskId, target: TaskStatus) -> MoveStart {
        if self.columns.task(task_id).is_none() {
            return MoveStart::NotFound;
        }
        self.next_move += 1;
        let move_id = MoveId(self.next_move);
        let busy = self
            .log
            .iter()
            .any(|e| &e.task_id == task_id && e.is_unresolved());
        let entry = Entry {
            move_id,
            task_id: task_id.clone(),
            target,
            state: if busy {
                EntryState::Queued
            } else {
                EntryState::InFlight
            },
        };
        entry.replay(&mut self.columns);
        self.log.push(entry);
        if busy {
            MoveStart::Queued(move_id)
        } else {
            MoveStart::Dispatch(PendingMove {
                move_id,
                task_id: task_id.clone(),
                target,
            })
        }
    }

    /// Records the store's acceptance of a move.
    ///
    /// Returns the queued move of the same task that should be dispatched
    /// next, if any. Unknown move ids are ignored.
    pub fn commit_move(&mut self, move_id: MoveId, record: Task) -> Option<PendingMove> {
        let entry = self.log.iter_mut().find(|e| e.move_id == move_id)?;
        entry.state = EntryState::Committed(record);
        let task_id = entry.task_id.clone();
        self.prune();
        self.replay();
        self.dispatch_next(&task_id)
    }

    /// Reverts a move the store refused. Unknown move ids yield `None`.
    pub fn fail_move(&mut self, move_id: MoveId) -> Option<FailResolution> {
        let index = self.log.iter().position(|e| e.move_id == move_id)?;
        let entry = self.log.remove(index);
        let title = self.columns.task(&entry.task_id).map(|t| t.title.clone());
        self.prune();
        self.replay();
        let next = self.dispatch_next(&entry.task_id);
        Some(FailResolution {
            task_id: entry.task_id,
            title,
            next,
        })
    }

    fn dispatch_next(&mut self, task_id: &TaskId) -> Option<PendingMove> {
        if self
            .log
            .iter()
            .any(|e| &e.task_id == task_id && matches!(e.state, EntryState::InFlight))
        {
            return None;
        }
        let entry = self
            .log
            .iter_mut()
            .find(|e| &e.task_id == task_id && matches!(e.state, EntryState::Queued))?;
        entry.state = EntryState::InFlight;
        Some(PendingMove {
            move_id: entry.move_id,
            task_id: entry.task_id.clone(),
            target: entry.target,
        })
    }

    fn prune(&mut self) {
        while let Some(first) = self.log.first() {
            let EntryState::Committed(record) = &first.state else {
                break;
            };
            self.base.apply_record(record.clone());
            self.log.remove(0);
        }
    }

    fn replay(&mut self) {
        let mut columns = self.base.clone();
        for entry in &self.log {
            entry.replay(&mut columns);
        }
        self.columns = columns;
    }
}

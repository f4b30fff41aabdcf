//! The four-column partition of a project's tasks.
//!
//! [`Columns`] always holds exactly one [`Column`] per [`TaskStatus`], in
//! board order. Every mutation keeps two invariants:
//!
//! - each task appears in exactly one column (partition)
//! - a task's `status` equals the id of the column holding it (membership)

use std::collections::HashSet;

use taskzenith_proto::task::{StatusValue, Task, TaskId, TaskStatus};

/// A named bucket of tasks sharing one status, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// The status every task in this column has.
    pub id: TaskStatus,
    /// Column heading.
    pub title: &'static str,
    /// Tasks in display order.
    pub tasks: Vec<Task>,
}

impl Column {
    fn new(id: TaskStatus) -> Self {
        Self {
            id,
            title: id.title(),
            tasks: Vec::new(),
        }
    }
}

/// Snapshot of the whole board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    columns: [Column; 4],
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            columns: TaskStatus::ALL.map(Column::new),
        }
    }
}

impl Columns {
    /// Creates a board with four empty columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Partitions tasks by status, preserving their relative order.
    ///
    /// Tasks whose status is not a board stage are left out; their ids are
    /// returned alongside the board.
    #[must_use]
    pub fn partition(tasks: Vec<Task>) -> (Self, Vec<TaskId>) {
        let mut board = Self::new();
        let mut dropped = Vec::new();
        for task in tasks {
            match task.status() {
                Some(status) => board.columns[status.index()].tasks.push(task),
                None => dropped.push(task.id),
            }
        }
        (board, dropped)
    }

    /// Iterates columns in board order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Returns the column for a status.
    #[must_use]
    pub const fn column(&self, status: TaskStatus) -> &Column {
        &self.columns[status.index()]
    }

    /// Total number of tasks on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    /// Returns `true` if no column holds a task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.tasks.is_empty())
    }

    /// Locates a task: its column and index within that column.
    #[must_use]
    pub fn position(&self, task_id: &TaskId) -> Option<(TaskStatus, usize)> {
        self.columns.iter().find_map(|column| {
            column
                .tasks
                .iter()
                .position(|t| &t.id == task_id)
                .map(|index| (column.id, index))
        })
    }

    /// Looks up a task in any column.
    #[must_use]
    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        let (status, index) = self.position(task_id)?;
        self.columns[status.index()].tasks.get(index)
    }

    /// Ids of all tasks in board order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter().map(|t| t.id.clone()))
            .collect()
    }

    /// Moves a task to the end of `target`, setting its status.
    ///
    /// Returns `false` and leaves the board untouched if the task is absent.
    pub fn move_task(&mut self, task_id: &TaskId, target: TaskStatus) -> bool {
        let Some(mut task) = self.remove(task_id) else {
            return false;
        };
        task.status = StatusValue::Known(target);
        self.columns[target.index()].tasks.push(task);
        true
    }

    /// Applies an authoritative record for a task already on the board.
    ///
    /// The task is moved to the record's status (appended, exactly like
    /// [`move_task`](Self::move_task)) and its contents replaced. A record
    /// with an unrecognized status removes the task. Returns `false` if the
    /// task is not on the board.
    pub fn apply_record(&mut self, record: Task) -> bool {
        let Some(status) = record.status() else {
            return self.remove(&record.id).is_some();
        };
        if !self.move_task(&record.id, status) {
            return false;
        }
        if let Some(slot) = self.columns[status.index()].tasks.last_mut() {
            *slot = record;
        }
        true
    }

    /// Returns `true` if the partition and membership invariants hold.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashSet::new();
        self.columns.iter().all(|column| {
            column
                .tasks
                .iter()
                .all(|t| t.status() == Some(column.id) && seen.insert(t.id.clone()))
        })
    }

    fn remove(&mut self, task_id: &TaskId) -> Option<Task> {
        let (status, index) = self.position(task_id)?;
        Some(self.columns[status.index()].tasks.remove(index))
    }
}

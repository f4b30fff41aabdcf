//! In-memory task store.
//!
//! Holds tasks in insertion order behind a shared lock. Clones share the same
//! state, so a test can keep one handle for failure injection while the board
//! synchronizer owns another.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use taskzenith_proto::task::{Priority, Task, TaskId, TaskPatch, TaskStatus, User};

use super::{StoreError, TaskStore};

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    fail_fetches: usize,
    fail_updates: usize,
    updates: Vec<(TaskId, TaskPatch)>,
}

/// Process-local [`TaskStore`] with failure injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `tasks` in the given order.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::new();
        store.inner.lock().tasks = tasks;
        store
    }

    /// Creates a store seeded with the `proj-1` demo board.
    #[must_use]
    pub fn demo() -> Self {
        Self::with_tasks(demo_tasks())
    }

    /// Appends a task.
    pub fn insert(&self, task: Task) {
        self.inner.lock().tasks.push(task);
    }

    /// Makes the next `n` fetches fail with [`StoreError::Unavailable`].
    pub fn fail_next_fetches(&self, n: usize) {
        self.inner.lock().fail_fetches = n;
    }

    /// Makes the next `n` updates fail with [`StoreError::Unavailable`].
    pub fn fail_next_updates(&self, n: usize) {
        self.inner.lock().fail_updates = n;
    }

    /// Returns every update received so far, successful or not, in arrival order.
    #[must_use]
    pub fn updates(&self) -> Vec<(TaskId, TaskPatch)> {
        self.inner.lock().updates.clone()
    }

    /// Returns the stored record of a task.
    #[must_use]
    pub fn get(&self, task_id: &TaskId) -> Option<Task> {
        self.inner
            .lock()
            .tasks
            .iter()
            .find(|t| &t.id == task_id)
            .cloned()
    }
}

impl TaskStore for InMemoryTaskStore {
    async fn fetch_by_project(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        let mut inner = self.inner.lock();
        if inner.fail_fetches > 0 {
            inner.fail_fetches -= 1;
            return Err(StoreError::Unavailable("injected fetch failure".to_string()));
        }
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update(&self, task_id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock();
        inner.updates.push((task_id.clone(), patch.clone()));
        if inner.fail_updates > 0 {
            inner.fail_updates -= 1;
            return Err(StoreError::Unavailable("injected update failure".to_string()));
        }
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == task_id)
            .ok_or_else(|| StoreError::NotFound(format!("task {task_id}")))?;
        task.apply_patch(patch, Utc::now(), |id| Some(User::placeholder(id)))
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        Ok(task.clone())
    }
}

fn demo_task(id: &str, title: &str, status: TaskStatus, priority: Priority, day: u32) -> Task {
    let created = DateTime::parse_from_rfc3339(&format!("2024-05-{day:02}T10:00:00Z"))
        .map_or_else(|_| Utc::now(), |ts| ts.with_timezone(&Utc));
    Task {
        id: TaskId::new(id),
        title: title.to_string(),
        description: None,
        status: status.into(),
        priority,
        assignees: Vec::new(),
        project_id: "proj-1".to_string(),
        due_date: None,
        created_at: created,
        updated_at: created,
        comments: Vec::new(),
    }
}

fn demo_tasks() -> Vec<Task> {
    vec![
        demo_task(
            "task-1",
            "Implement authentication module",
            TaskStatus::Done,
            Priority::High,
            1,
        ),
        demo_task(
            "task-2",
            "Design database schema",
            TaskStatus::InProgress,
            Priority::High,
            3,
        ),
        demo_task(
            "task-3",
            "Develop API for user profiles",
            TaskStatus::InProgress,
            Priority::Medium,
            5,
        ),
        demo_task(
            "task-4",
            "Create UI mockups for dashboard",
            TaskStatus::Todo,
            Priority::Medium,
            7,
        ),
        demo_task(
            "task-5",
            "Set up CI/CD pipeline",
            TaskStatus::Todo,
            Priority::Critical,
            8,
        ),
        demo_task(
            "task-7",
            "User testing for new feature",
            TaskStatus::Backlog,
            Priority::Medium,
            9,
        ),
    ]
}

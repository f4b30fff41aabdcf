//! REST route layout shared by the server and the HTTP client.
//!
//! Paths are relative to the server's base URL. Error responses carry an
//! [`ErrorBody`].

use serde::{Deserialize, Serialize};

/// Route template for listing/creating projects.
pub const PROJECTS_ROUTE: &str = "/api/projects";
/// Route template for a project's task list.
pub const PROJECT_TASKS_ROUTE: &str = "/api/projects/{id}/tasks";
/// Route template for listing all tasks.
pub const TASKS_ROUTE: &str = "/api/tasks";
/// Route template for a single task.
pub const TASK_ROUTE: &str = "/api/tasks/{id}";
/// Route template for a task's comments.
pub const TASK_COMMENTS_ROUTE: &str = "/api/tasks/{id}/comments";
/// Liveness check.
pub const HEALTH_ROUTE: &str = "/health";

/// JSON body of every non-success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub message: String,
}

impl ErrorBody {
    /// Creates an error body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Path segments of a project's task list, relative to the base URL.
///
/// Ids are kept as single segments; callers must percent-encode them.
#[must_use]
pub const fn project_tasks_segments(project_id: &str) -> [&str; 4] {
    ["api", "projects", project_id, "tasks"]
}

/// Path segments of a single task.
#[must_use]
pub const fn task_segments(task_id: &str) -> [&str; 3] {
    ["api", "tasks", task_id]
}

/// Path segments of a task's comment list.
#[must_use]
pub const fn task_comments_segments(task_id: &str) -> [&str; 4] {
    ["api", "tasks", task_id, "comments"]
}

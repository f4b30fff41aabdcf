//! In-memory task repository backing the REST API.
//!
//! Projects and tasks are kept in insertion order so that
//! `GET /api/projects/{id}/tasks` returns a stable ordering. User profiles are
//! looked up by id; unknown ids get a placeholder profile.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use taskzenith_proto::project::{NewProject, Project, ProjectStatus};
use taskzenith_proto::task::{
    Comment, NewComment, NewTask, PatchError, StatusValue, Task, TaskId, TaskPatch, TaskStatus,
    User, validate_title,
};

/// Errors returned by [`TaskRepository`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// No project with this id.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// No task with this id.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// The request failed validation.
    #[error("{0}")]
    Invalid(String),

    /// The patch was rejected.
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Errors loading a seed file.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The file could not be read.
    #[error("failed to read seed file {path}: {source}")]
    Read {
        /// Seed file path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not a valid seed document.
    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Initial contents of a repository, as read from a JSON seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    /// Projects in display order.
    pub projects: Vec<Project>,
    /// Tasks in display order.
    pub tasks: Vec<Task>,
    /// Known user profiles.
    pub users: Vec<User>,
}

impl Seed {
    /// Reads a seed from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SeedError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[derive(Debug, Default)]
struct Inner {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    users: HashMap<String, User>,
}

impl Inner {
    fn user(&self, id: &str) -> User {
        self.users
            .get(id)
            .cloned()
            .unwrap_or_else(|| User::placeholder(id))
    }

    fn has_project(&self, project_id: &str) -> bool {
        self.projects.iter().any(|p| p.id == project_id)
    }

    fn task_mut(&mut self, task_id: &str) -> Result<&mut Task, RepoError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id.as_str() == task_id)
            .ok_or_else(|| RepoError::TaskNotFound(task_id.to_string()))
    }
}

/// Thread-safe task repository.
#[derive(Debug, Default)]
pub struct TaskRepository {
    inner: RwLock<Inner>,
}

impl TaskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding the seed's contents.
    #[must_use]
    pub fn from_seed(seed: Seed) -> Self {
        let users = seed.users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            inner: RwLock::new(Inner {
                projects: seed.projects,
                tasks: seed.tasks,
                users,
            }),
        }
    }

    /// Lists all projects.
    pub async fn projects(&self) -> Vec<Project> {
        self.inner.read().await.projects.clone()
    }

    /// Creates a project with a generated id.
    ///
    /// # Errors
    ///
    /// [`RepoError::Invalid`] if the name is empty.
    pub async fn create_project(&self, new: NewProject) -> Result<Project, RepoError> {
        if new.name.trim().is_empty() {
            return Err(RepoError::Invalid("project name is required".to_string()));
        }
        let project = Project {
            id: format!("proj-{}", Uuid::now_v7()),
            name: new.name,
            description: new.description,
            color: new.color.or_else(|| Some("#6366f1".to_string())),
            status: ProjectStatus::OnTrack,
        };
        self.inner.write().await.projects.push(project.clone());
        Ok(project)
    }

    /// Tasks of one project, in insertion order.
    ///
    /// # Errors
    ///
    /// [`RepoError::ProjectNotFound`] for an unknown project.
    pub async fn project_tasks(&self, project_id: &str) -> Result<Vec<Task>, RepoError> {
        let inner = self.inner.read().await;
        if !inner.has_project(project_id) {
            return Err(RepoError::ProjectNotFound(project_id.to_string()));
        }
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    /// All tasks across projects.
    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.read().await.tasks.clone()
    }

    /// Looks up one task.
    pub async fn task(&self, task_id: &str) -> Option<Task> {
        self.inner
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.id.as_str() == task_id)
            .cloned()
    }

    /// Creates a task in `todo`.
    ///
    /// # Errors
    ///
    /// [`RepoError::ProjectNotFound`] or a title validation error.
    pub async fn create_task(&self, project_id: &str, new: NewTask) -> Result<Task, RepoError> {
        validate_title(&new.title)?;
        let mut inner = self.inner.write().await;
        if !inner.has_project(project_id) {
            return Err(RepoError::ProjectNotFound(project_id.to_string()));
        }
        let now = Utc::now();
        let assignees = new.assignees.iter().map(|id| inner.user(id)).collect();
        let task = Task {
            id: TaskId::generate(),
            title: new.title,
            description: new.description.filter(|d| !d.is_empty()),
            status: StatusValue::Known(TaskStatus::Todo),
            priority: new.priority,
            assignees,
            project_id: project_id.to_string(),
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
        };
        inner.tasks.push(task.clone());
        drop(inner);
        tracing::debug!(task_id = %task.id, project_id, "task created");
        Ok(task)
    }

    /// Applies a partial update and returns the new record.
    ///
    /// # Errors
    ///
    /// [`RepoError::TaskNotFound`] or [`RepoError::Patch`].
    pub async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Task, RepoError> {
        self.update_task_at(task_id, patch, Utc::now()).await
    }

    async fn update_task_at(
        &self,
        task_id: &str,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Task, RepoError> {
        let mut inner = self.inner.write().await;
        let users = inner.users.clone();
        let task = inner.task_mut(task_id)?;
        task.apply_patch(patch, now, |id| {
            Some(users.get(id).cloned().unwrap_or_else(|| User::placeholder(id)))
        })?;
        Ok(task.clone())
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// [`RepoError::TaskNotFound`] for an unknown id.
    pub async fn delete_task(&self, task_id: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id.as_str() != task_id);
        if inner.tasks.len() == before {
            return Err(RepoError::TaskNotFound(task_id.to_string()));
        }
        Ok(())
    }

    /// Appends a comment to a task.
    ///
    /// # Errors
    ///
    /// [`RepoError::Invalid`] for empty content, [`RepoError::TaskNotFound`]
    /// for an unknown task.
    pub async fn add_comment(&self, task_id: &str, new: NewComment) -> Result<Comment, RepoError> {
        if new.content.trim().is_empty() {
            return Err(RepoError::Invalid("comment cannot be empty".to_string()));
        }
        let mut inner = self.inner.write().await;
        let comment = Comment {
            id: format!("comment-{}", Uuid::now_v7()),
            content: new.content,
            created_at: Utc::now(),
            author: inner.user(&new.author),
        };
        let task = inner.task_mut(task_id)?;
        task.comments.push(comment.clone());
        Ok(comment)
    }
}

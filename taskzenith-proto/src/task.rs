//! Task records exchanged with the task store.
//!
//! A [`Task`] is serialized as camelCase JSON. Its `status` is carried as a
//! [`StatusValue`] so that a backend which has drifted to a status outside the
//! four board stages still decodes; consumers decide what to do with
//! [`StatusValue::Unrecognized`] tasks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 256;

/// Opaque task identifier, stable for the task's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh time-ordered identifier (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Workflow stage of a task. Declaration order is board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not yet scheduled.
    Backlog,
    /// Scheduled, not started.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// All stages in board order.
    pub const ALL: [Self; 4] = [Self::Backlog, Self::Todo, Self::InProgress, Self::Done];

    /// Wire name of the stage (`"in-progress"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Human-readable column heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Position of the stage on the board (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Backlog => 0,
            Self::Todo => 1,
            Self::InProgress => 2,
            Self::Done => 3,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a string that is not a board stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized task status: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Status as found on the wire: a known stage, or whatever the backend sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    /// One of the four board stages.
    Known(TaskStatus),
    /// Any other string, kept verbatim.
    Unrecognized(String),
}

impl StatusValue {
    /// Returns the stage, or `None` for an unrecognized value.
    #[must_use]
    pub const fn known(&self) -> Option<TaskStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<TaskStatus> for StatusValue {
    fn from(status: TaskStatus) -> Self {
        Self::Known(status)
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(status) => status.fmt(f),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low.
    Low,
    /// Medium.
    #[default]
    Medium,
    /// High.
    High,
    /// Critical.
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A team member as embedded in task records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Avatar URL.
    pub avatar: String,
}

impl User {
    /// Builds a profile for a user id that has no stored profile.
    #[must_use]
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("user-{id}@example.com"),
            avatar: format!("https://i.pravatar.cc/150?u={id}"),
        }
    }
}

/// A comment attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment identifier.
    pub id: String,
    /// Comment body.
    pub content: String,
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
    /// Who posted it.
    pub author: User,
}

/// A task record as returned by the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable identifier.
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Optional long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Workflow stage.
    pub status: StatusValue,
    /// Priority.
    pub priority: Priority,
    /// Assigned team members.
    #[serde(default)]
    pub assignees: Vec<User>,
    /// Owning project.
    pub project_id: String,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Creation time, assigned by the store.
    pub created_at: DateTime<Utc>,
    /// Last modification time, assigned by the store.
    pub updated_at: DateTime<Utc>,
    /// Discussion thread.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Task {
    /// Returns the board stage, or `None` if the store sent an unknown status.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status.known()
    }

    /// Applies a partial update, stamping `updated_at` with `now`.
    ///
    /// `resolve_user` maps an assignee id to a profile; returning `None`
    /// rejects the patch. Nothing is modified when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError`] if a present title is empty or too long, or an
    /// assignee id cannot be resolved.
    pub fn apply_patch(
        &mut self,
        patch: &TaskPatch,
        now: DateTime<Utc>,
        resolve_user: impl Fn(&str) -> Option<User>,
    ) -> Result<(), PatchError> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        let assignees = match &patch.assignees {
            Some(ids) => Some(
                ids.iter()
                    .map(|id| resolve_user(id).ok_or_else(|| PatchError::UnknownAssignee(id.clone())))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description = (!description.is_empty()).then(|| description.clone());
        }
        if let Some(status) = patch.status {
            self.status = StatusValue::Known(status);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(assignees) = assignees {
            self.assignees = assignees;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Checks a task title against the length rules.
///
/// # Errors
///
/// Returns [`PatchError::TitleEmpty`] or [`PatchError::TitleTooLong`].
pub fn validate_title(title: &str) -> Result<(), PatchError> {
    if title.is_empty() {
        return Err(PatchError::TitleEmpty);
    }
    if title.chars().count() > MAX_TASK_TITLE_LENGTH {
        return Err(PatchError::TitleTooLong);
    }
    Ok(())
}

/// Reasons a patch or new-task request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Title was present but empty.
    #[error("title is required")]
    TitleEmpty,
    /// Title exceeds [`MAX_TASK_TITLE_LENGTH`] characters.
    #[error("title too long (max 256 characters)")]
    TitleTooLong,
    /// An assignee id does not name a known user.
    #[error("unknown assignee: {0}")]
    UnknownAssignee(String),
}

/// Partial update of a task. Absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description; an empty string clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New workflow stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Replacement assignee list, as user ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
}

impl TaskPatch {
    /// A patch that only changes the workflow stage.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assignees.is_none()
    }
}

/// Request body for creating a task in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Title (required).
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Initial assignees, as user ids.
    #[serde(default)]
    pub assignees: Vec<String>,
}

/// Request body for posting a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    /// Comment body (required).
    pub content: String,
    /// User id of the author.
    pub author: String,
}

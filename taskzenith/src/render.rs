//! Plain-text rendering of boards and tasks for the CLI.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use taskzenith_proto::task::{Priority, Task};

use crate::board::Columns;

/// Display options for [`board`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Print each task's description under its title.
    pub show_descriptions: bool,
}

const fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "  ",
        Priority::Medium => "· ",
        Priority::High => "! ",
        Priority::Critical => "!!",
    }
}

/// Renders the four columns one after another.
#[must_use]
pub fn board(project_id: &str, columns: &Columns, options: RenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project {project_id} ({} tasks)", columns.len());
    for column in columns.iter() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} [{}]", column.title, column.tasks.len());
        if column.tasks.is_empty() {
            let _ = writeln!(out, "  (empty)");
        }
        for task in &column.tasks {
            let _ = writeln!(
                out,
                "  {} {}  {}",
                priority_marker(task.priority),
                task.id,
                task.title
            );
            let description = task.description.as_deref().filter(|d| !d.is_empty());
            if let Some(description) = description.filter(|_| options.show_descriptions) {
                let _ = writeln!(out, "       {description}");
            }
        }
    }
    out
}

fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y").to_string()
}

/// Renders a task's detail view.
#[must_use]
pub fn task(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", task.title);
    let due = task
        .due_date
        .as_ref()
        .map_or_else(|| "N/A".to_string(), format_date);
    let _ = writeln!(
        out,
        "{} | {} | due on {due}",
        task.status, task.priority
    );
    let _ = writeln!(out, "id {} in project {}", task.id, task.project_id);

    let _ = writeln!(out, "\nAssignees");
    if task.assignees.is_empty() {
        let _ = writeln!(out, "  No one assigned");
    }
    for user in &task.assignees {
        let _ = writeln!(out, "  {} <{}>", user.name, user.email);
    }

    let _ = writeln!(out, "\nDescription");
    let description = task
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("No description provided.");
    let _ = writeln!(out, "  {description}");

    let _ = writeln!(out, "\nActivity");
    if task.comments.is_empty() {
        let _ = writeln!(out, "  No comments yet.");
    }
    for comment in &task.comments {
        let _ = writeln!(
            out,
            "  {} ({}): {}",
            comment.author.name,
            format_date(&comment.created_at),
            comment.content
        );
    }
    out
}

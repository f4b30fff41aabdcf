//! Project records.

use serde::{Deserialize, Serialize};

/// Health of a project as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    /// On schedule.
    #[default]
    #[serde(rename = "On Track")]
    OnTrack,
    /// Slipping.
    #[serde(rename = "At Risk")]
    AtRisk,
    /// Behind schedule.
    #[serde(rename = "Off Track")]
    OffTrack,
    /// Finished.
    #[serde(rename = "Completed")]
    Completed,
}

/// A project owning a set of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional accent color (`#rrggbb`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Project health.
    #[serde(default)]
    pub status: ProjectStatus,
}

/// Request body for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    /// Display name (required).
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional accent color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

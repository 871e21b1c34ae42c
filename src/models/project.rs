use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A body of work owned by one organization.
///
/// Project names are unique within their organization (enforced at the
/// storage layer). Deleting the owning organization deletes the project
/// and everything under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    /// Optional calendar due date.
    pub due_date: Option<NaiveDate>,
    /// URL-safe identifier derived from the project and organization names.
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The lifecycle status of a project.
///
/// Transitions are application-level only; any status can move to any
/// other via an explicit update.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "on_hold" => Some(Self::OnHold),
            _ => None,
        }
    }
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub organization_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Initial status. Defaults to `Active` if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Input for updating an existing project.
///
/// A field that is present is applied, even when empty; a field that is
/// absent is left unchanged. `due_date` accepts an explicit null to clear
/// the date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub due_date: Option<Option<NaiveDate>>,
}

/// A project with its derived task metrics, used for read responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithMetrics {
    #[serde(flatten)]
    pub project: Project,
    pub task_count: i64,
    pub completed_task_count: i64,
    /// Percentage of tasks that are done, in `[0, 100]`. Defined as 0
    /// when the project has no tasks.
    pub completion_rate: f64,
}

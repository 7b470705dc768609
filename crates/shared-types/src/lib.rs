use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub mod day_blocks;

pub use day_blocks::{
    resize, validate_layout, Boundary, DayTemplate, HourRange, HourSpan, LayoutError,
};

/// Deserialize a field that distinguishes "absent" (`None`) from an explicit
/// `null` (`Some(None)`). Pair with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Workspaces, projects, tags
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWorkspaceRequest {
    pub name: String,
}

pub const DEFAULT_PROJECT_COLOR: &str = "#6366f1";
pub const DEFAULT_TAG_COLOR: &str = "#8b5cf6";
pub const DEFAULT_TAG_ICON: &str = "tag";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Project {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub workspace_id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// The slice of a project embedded in task responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Tag {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub color: String,
    /// Icon name shown next to the tag in the UI.
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub workspace_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
    Extended,
    Missed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
            TaskStatus::Extended => "extended",
            TaskStatus::Missed => "missed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "done" => Some(TaskStatus::Done),
            "extended" => Some(TaskStatus::Extended),
            "missed" => Some(TaskStatus::Missed),
            _ => None,
        }
    }
}

/// Task with its project summary and tags, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub block_id: Option<Uuid>,
    pub project: ProjectSummary,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub block_id: Option<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Partial task update. Nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub duration_minutes: Option<Option<i32>>,
    pub status: Option<TaskStatus>,
    pub project_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub block_id: Option<Option<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskListQuery {
    pub project_id: Option<Uuid>,
    pub workspace_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub pending: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct TaskTemplate {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskTemplateRequest {
    pub project_id: Uuid,
    pub title: String,
}

// ============================================================================
// Focus timer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct TimerSession {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimerSessionRequest {
    pub task_id: Option<Uuid>,
    pub duration_seconds: i32,
}

// ============================================================================
// Day blocks
// ============================================================================

/// A day block joined with its project's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBlock {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub date: NaiveDate,
    pub start_hour: i32,
    pub end_hour: i32,
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub project_color: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl HourRange for DayBlock {
    fn start_hour(&self) -> i32 {
        self.start_hour
    }

    fn end_hour(&self) -> i32 {
        self.end_hour
    }

    fn set_start_hour(&mut self, hour: i32) {
        self.start_hour = hour;
    }

    fn set_end_hour(&mut self, hour: i32) {
        self.end_hour = hour;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayBlockQuery {
    pub workspace_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyTemplateRequest {
    pub workspace_id: Uuid,
    pub date: NaiveDate,
    pub template: Option<String>,
}

/// Either a project assignment or a retime, as sent to `PUT /day-blocks/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDayBlockRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub project_id: Option<Option<Uuid>>,
    pub start_hour: Option<i32>,
    pub end_hour: Option<i32>,
}

/// Proposed timing for one block in a batch retime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTiming {
    pub id: Uuid,
    pub start_hour: i32,
    pub end_hour: i32,
}

impl From<&DayBlock> for BlockTiming {
    fn from(block: &DayBlock) -> Self {
        BlockTiming {
            id: block.id,
            start_hour: block.start_hour,
            end_hour: block.end_hour,
        }
    }
}

impl HourRange for BlockTiming {
    fn start_hour(&self) -> i32 {
        self.start_hour
    }

    fn end_hour(&self) -> i32 {
        self.end_hour
    }

    fn set_start_hour(&mut self, hour: i32) {
        self.start_hour = hour;
    }

    fn set_end_hour(&mut self, hour: i32) {
        self.end_hour = hour;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRetimeRequest {
    pub workspace_id: Uuid,
    pub date: NaiveDate,
    pub blocks: Vec<BlockTiming>,
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinStatusResponse {
    #[serde(rename = "hasPin")]
    pub has_pin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinRequest {
    pub pin: String,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordLoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

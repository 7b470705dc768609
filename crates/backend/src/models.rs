// Database models for Diesel
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use planner_types::{DayBlock, ProjectSummary, Tag, Task, TaskStatus};
use uuid::Uuid;

/// Database representation of day_blocks, without the project join
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::day_blocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DayBlockRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub date: NaiveDate,
    pub start_hour: i32,
    pub end_hour: i32,
    pub project_id: Option<Uuid>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl DayBlockRow {
    /// Attach the project's display fields from a `LEFT JOIN projects`.
    pub fn joined(self, project_name: Option<String>, project_color: Option<String>) -> DayBlock {
        DayBlock {
            id: self.id,
            workspace_id: self.workspace_id,
            date: self.date,
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            project_id: self.project_id,
            project_name,
            project_color,
            sort_order: self.sort_order,
            created_at: self.created_at,
        }
    }
}

/// Insertable struct for new day blocks
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::day_blocks)]
pub struct NewDayBlock {
    pub workspace_id: Uuid,
    pub date: NaiveDate,
    pub start_hour: i32,
    pub end_hour: i32,
    pub sort_order: i32,
}

/// Database representation of tasks; status is stored as VARCHAR
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub block_id: Option<Uuid>,
}

impl TaskRow {
    pub fn into_task(self, project: ProjectSummary, tags: Vec<Tag>) -> Task {
        let status = TaskStatus::from_str(&self.status).unwrap_or_else(|| {
            tracing::warn!("Unknown task status {:?} on task {}", self.status, self.id);
            TaskStatus::Pending
        });

        Task {
            id: self.id,
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            scheduled_at: self.scheduled_at,
            duration_minutes: self.duration_minutes,
            status,
            created_at: self.created_at,
            completed_at: self.completed_at,
            block_id: self.block_id,
            project,
            tags,
        }
    }
}

/// Insertable struct for new tasks
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::tasks)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub status: String,
    pub block_id: Option<Uuid>,
}

/// Partial update for tasks. `None` leaves a column alone, `Some(None)` nulls it.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = crate::schema::tasks)]
pub struct TaskChangeset {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    pub duration_minutes: Option<Option<i32>>,
    pub status: Option<String>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub project_id: Option<Uuid>,
    pub block_id: Option<Option<Uuid>>,
}

impl TaskChangeset {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.scheduled_at.is_none()
            && self.duration_minutes.is_none()
            && self.status.is_none()
            && self.completed_at.is_none()
            && self.project_id.is_none()
            && self.block_id.is_none()
    }
}

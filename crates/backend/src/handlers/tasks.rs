use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use planner_types::{
    CreateTaskRequest, SuccessResponse, Task, TaskListQuery, TaskStatus, UpdateTaskRequest,
};
use uuid::Uuid;

use crate::db::{get_conn, tasks};
use crate::error::{ApiError, ApiResult};
use crate::models::{NewTask, TaskChangeset};
use crate::AppState;

/// Translate a partial update into column changes.
///
/// Marking a task done stamps `completed_at`; any other status clears it.
fn changeset_for(payload: &UpdateTaskRequest, now: DateTime<Utc>) -> TaskChangeset {
    let completed_at = payload.status.map(|status| match status {
        TaskStatus::Done => Some(now),
        _ => None,
    });

    TaskChangeset {
        title: payload.title.clone(),
        description: payload.description.clone(),
        scheduled_at: payload.scheduled_at,
        duration_minutes: payload.duration_minutes,
        status: payload.status.map(|s| s.as_str().to_string()),
        completed_at,
        project_id: payload.project_id,
        block_id: payload.block_id,
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = tasks::list(&mut conn, &query).await?;
    Ok(Json(items))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let mut conn = get_conn(&state.pool).await?;
    tasks::get_by_id(&mut conn, task_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task"))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("Task title is required"));
    }

    let new_task = NewTask {
        project_id: payload.project_id,
        title: payload.title.trim().to_string(),
        description: payload.description,
        scheduled_at: payload.scheduled_at,
        duration_minutes: payload.duration_minutes,
        status: TaskStatus::Pending.as_str().to_string(),
        block_id: payload.block_id,
    };

    let mut conn = get_conn(&state.pool).await?;
    let task = tasks::create(&mut conn, new_task, &payload.tag_ids).await?;
    tracing::debug!("Created task {} in project {}", task.id, task.project_id);

    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    if matches!(payload.title.as_deref(), Some(t) if t.trim().is_empty()) {
        return Err(ApiError::bad_request("Task title cannot be empty"));
    }

    let changes = changeset_for(&payload, Utc::now());

    let mut conn = get_conn(&state.pool).await?;
    tasks::update(&mut conn, task_id, changes, payload.tag_ids)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task"))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    tasks::delete(&mut conn, task_id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_stamps_completion() {
        let now = Utc::now();
        let payload = UpdateTaskRequest {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };

        let changes = changeset_for(&payload, now);
        assert_eq!(changes.status.as_deref(), Some("done"));
        assert_eq!(changes.completed_at, Some(Some(now)));
        assert!(changes.title.is_none());
    }

    #[test]
    fn test_reopening_clears_completion() {
        let payload = UpdateTaskRequest {
            status: Some(TaskStatus::Pending),
            ..Default::default()
        };

        let changes = changeset_for(&payload, Utc::now());
        assert_eq!(changes.completed_at, Some(None));
    }

    #[test]
    fn test_untouched_fields_stay_out_of_changeset() {
        let payload: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"Write report","block_id":null}"#).unwrap();

        let changes = changeset_for(&payload, Utc::now());
        assert_eq!(changes.title.as_deref(), Some("Write report"));
        assert_eq!(changes.block_id, Some(None));
        assert_eq!(changes.completed_at, None);
        assert_eq!(changes.description, None);
        assert!(!changes.is_empty());
    }
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use planner_types::{CreateTaskTemplateRequest, SuccessResponse, TaskTemplate};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{get_conn, task_templates};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TemplateListQuery {
    pub project_id: Option<Uuid>,
}

pub async fn list_task_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateListQuery>,
) -> ApiResult<Json<Vec<TaskTemplate>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = task_templates::list(&mut conn, query.project_id).await?;
    Ok(Json(items))
}

pub async fn create_task_template(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskTemplateRequest>,
) -> ApiResult<Json<TaskTemplate>> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Template title is required"));
    }

    let mut conn = get_conn(&state.pool).await?;
    let template = task_templates::create(&mut conn, payload.project_id, title).await?;

    Ok(Json(template))
}

pub async fn delete_task_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    task_templates::delete(&mut conn, template_id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use planner_types::{
    CreateProjectRequest, Project, SuccessResponse, UpdateProjectRequest, DEFAULT_PROJECT_COLOR,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{get_conn, projects};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub workspace_id: Option<Uuid>,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = projects::list(&mut conn, query.workspace_id).await?;
    Ok(Json(items))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let mut conn = get_conn(&state.pool).await?;
    projects::get_by_id(&mut conn, project_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project"))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Project name is required"));
    }
    let color = payload.color.as_deref().unwrap_or(DEFAULT_PROJECT_COLOR);

    let mut conn = get_conn(&state.pool).await?;
    let project = projects::create(&mut conn, payload.workspace_id, name, color).await?;

    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let mut conn = get_conn(&state.pool).await?;
    projects::update(
        &mut conn,
        project_id,
        payload.name.as_deref(),
        payload.color.as_deref(),
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("Project"))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    projects::delete(&mut conn, project_id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

use axum::{
    extract::{Path, State},
    Json,
};
use planner_types::{CreateWorkspaceRequest, SuccessResponse, UpdateWorkspaceRequest, Workspace};
use uuid::Uuid;

use crate::db::{get_conn, workspaces};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn require_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Workspace name is required"));
    }
    Ok(name)
}

pub async fn list_workspaces(State(state): State<AppState>) -> ApiResult<Json<Vec<Workspace>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = workspaces::list_all(&mut conn).await?;
    Ok(Json(items))
}

pub async fn get_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Workspace>> {
    let mut conn = get_conn(&state.pool).await?;
    workspaces::get_by_id(&mut conn, workspace_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Workspace"))
}

pub async fn create_workspace(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkspaceRequest>,
) -> ApiResult<Json<Workspace>> {
    let name = require_name(&payload.name)?;

    let mut conn = get_conn(&state.pool).await?;
    let workspace = workspaces::create(&mut conn, name).await?;
    tracing::info!("Created workspace {} ({})", workspace.name, workspace.id);

    Ok(Json(workspace))
}

pub async fn update_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<UpdateWorkspaceRequest>,
) -> ApiResult<Json<Workspace>> {
    let name = require_name(&payload.name)?;

    let mut conn = get_conn(&state.pool).await?;
    workspaces::rename(&mut conn, workspace_id, name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Workspace"))
}

/// Deleting a workspace cascades to its projects, tags and day blocks.
pub async fn delete_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    workspaces::delete(&mut conn, workspace_id).await?;
    tracing::info!("Deleted workspace {}", workspace_id);

    Ok(Json(SuccessResponse { success: true }))
}

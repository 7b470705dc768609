use axum::{
    extract::{Path, Query, State},
    Json,
};
use planner_types::{
    CreateTagRequest, SuccessResponse, Tag, UpdateTagRequest, DEFAULT_TAG_COLOR, DEFAULT_TAG_ICON,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{get_conn, tags};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TagListQuery {
    pub workspace_id: Option<Uuid>,
}

pub async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<TagListQuery>,
) -> ApiResult<Json<Vec<Tag>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = tags::list(&mut conn, query.workspace_id).await?;
    Ok(Json(items))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<CreateTagRequest>,
) -> ApiResult<Json<Tag>> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Tag name is required"));
    }
    let color = payload.color.as_deref().unwrap_or(DEFAULT_TAG_COLOR);
    let icon = payload.icon.as_deref().unwrap_or(DEFAULT_TAG_ICON);

    let mut conn = get_conn(&state.pool).await?;
    let tag = tags::create(&mut conn, payload.workspace_id, name, color, icon).await?;

    Ok(Json(tag))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
    Json(payload): Json<UpdateTagRequest>,
) -> ApiResult<Json<Tag>> {
    let mut conn = get_conn(&state.pool).await?;
    tags::update(
        &mut conn,
        tag_id,
        payload.name.as_deref(),
        payload.color.as_deref(),
        payload.icon.as_deref(),
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("Tag"))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    tags::delete(&mut conn, tag_id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use planner_types::{
    ApplyTemplateRequest, BatchRetimeRequest, DayBlock, DayBlockQuery, DayTemplate, HourSpan,
    UpdateDayBlockRequest,
};
use uuid::Uuid;

use crate::db::get_conn;
use crate::error::{ApiError, ApiResult};
use crate::repository::PgDayBlocks;
use crate::services::day_planner::DayPlanner;
use crate::AppState;

/// `GET /day-blocks?workspace_id=&date=`, seeding the day on first read.
pub async fn list_day_blocks(
    State(state): State<AppState>,
    Query(query): Query<DayBlockQuery>,
) -> ApiResult<Json<Vec<DayBlock>>> {
    let (workspace_id, date) = match (query.workspace_id, query.date) {
        (Some(ws), Some(date)) => (ws, date),
        _ => return Err(ApiError::bad_request("Missing workspace_id or date")),
    };

    let mut conn = get_conn(&state.pool).await?;
    let mut store = PgDayBlocks::new(&mut conn);
    let blocks = DayPlanner::get_or_seed(&mut store, workspace_id, date).await?;

    Ok(Json(blocks))
}

/// `POST /day-blocks`: replace the day with a template.
pub async fn apply_template(
    State(state): State<AppState>,
    Json(payload): Json<ApplyTemplateRequest>,
) -> ApiResult<Json<Vec<DayBlock>>> {
    let template = DayTemplate::from_name(payload.template.as_deref());

    let mut conn = get_conn(&state.pool).await?;
    let mut store = PgDayBlocks::new(&mut conn);
    let blocks =
        DayPlanner::apply_template(&mut store, payload.workspace_id, payload.date, template)
            .await?;

    Ok(Json(blocks))
}

/// `PUT /day-blocks/:id`: retime the block, assign its project, or both.
pub async fn update_day_block(
    State(state): State<AppState>,
    Path(block_id): Path<Uuid>,
    Json(payload): Json<UpdateDayBlockRequest>,
) -> ApiResult<Json<DayBlock>> {
    let span = match (payload.start_hour, payload.end_hour) {
        (Some(start), Some(end)) => Some(HourSpan::new(start, end)),
        (None, None) => None,
        _ => {
            return Err(ApiError::bad_request(
                "start_hour and end_hour must be provided together",
            ))
        }
    };
    if span.is_none() && payload.project_id.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let mut conn = get_conn(&state.pool).await?;
    let mut store = PgDayBlocks::new(&mut conn);

    let block = match (span, payload.project_id) {
        (Some(span), None) => DayPlanner::retime_block(&mut store, block_id, span).await?,
        (None, Some(project_id)) => {
            DayPlanner::assign_project(&mut store, block_id, project_id).await?
        }
        (span, project) => DayPlanner::update_block(&mut store, block_id, span, project).await?,
    };

    Ok(Json(block))
}

/// `PATCH /day-blocks/batch`: retime a whole day at once.
pub async fn batch_update_day_blocks(
    State(state): State<AppState>,
    Json(payload): Json<BatchRetimeRequest>,
) -> ApiResult<Json<Vec<DayBlock>>> {
    let mut conn = get_conn(&state.pool).await?;
    let mut store = PgDayBlocks::new(&mut conn);
    let blocks = DayPlanner::batch_retime(
        &mut store,
        payload.workspace_id,
        payload.date,
        &payload.blocks,
    )
    .await?;

    Ok(Json(blocks))
}

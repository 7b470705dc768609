use axum::{extract::State, Json};
use planner_types::{CreateTimerSessionRequest, TimerSession};

use crate::db::{get_conn, timer_sessions};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// The most recent focus sessions, newest first.
pub async fn list_timer_sessions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TimerSession>>> {
    let mut conn = get_conn(&state.pool).await?;
    let items = timer_sessions::list_recent(&mut conn).await?;
    Ok(Json(items))
}

pub async fn log_timer_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateTimerSessionRequest>,
) -> ApiResult<Json<TimerSession>> {
    if payload.duration_seconds < 0 {
        return Err(ApiError::bad_request("duration_seconds cannot be negative"));
    }

    let mut conn = get_conn(&state.pool).await?;
    let session =
        timer_sessions::create(&mut conn, payload.task_id, payload.duration_seconds).await?;

    Ok(Json(session))
}

pub mod day_blocks;
pub mod projects;
pub mod tags;
pub mod task_templates;
pub mod tasks;
pub mod timer;
pub mod workspaces;

use axum::http::StatusCode;

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::auth;
use crate::handlers::{day_blocks, projects, tags, task_templates, tasks, timer, workspaces};
use crate::AppState;

/// Routes that require a session.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Day block routes
        .route(
            "/day-blocks",
            get(day_blocks::list_day_blocks).post(day_blocks::apply_template),
        )
        .route(
            "/day-blocks/batch",
            patch(day_blocks::batch_update_day_blocks),
        )
        .route("/day-blocks/:id", put(day_blocks::update_day_block))
        // Workspace routes
        .route(
            "/workspaces",
            get(workspaces::list_workspaces).post(workspaces::create_workspace),
        )
        .route(
            "/workspaces/:id",
            get(workspaces::get_workspace)
                .put(workspaces::update_workspace)
                .delete(workspaces::delete_workspace),
        )
        // Project routes
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        // Tag routes
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/tags/:id", put(tags::update_tag).delete(tags::delete_tag))
        // Task routes
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        // Task template routes
        .route(
            "/task-templates",
            get(task_templates::list_task_templates).post(task_templates::create_task_template),
        )
        .route(
            "/task-templates/:id",
            delete(task_templates::delete_task_template),
        )
        // Focus timer routes
        .route(
            "/timer",
            get(timer::list_timer_sessions).post(timer::log_timer_session),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}

/// Everything mounted under `/api`.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/pin", get(auth::pin_status).post(auth::pin_auth))
        .route("/auth/login", post(auth::password_login))
        .route("/auth/logout", post(auth::logout))
        .merge(protected_routes(state))
}

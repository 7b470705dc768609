//! Unified error handling for the backend API.
//!
//! Handlers return [`ApiResult`] and use `?` freely; every error converts into
//! a JSON body with an appropriate HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::PoolError;
use planner_types::LayoutError;
use serde::Serialize;
use thiserror::Error;

use crate::repository::StaleBlock;
use crate::services::day_planner::PlannerError;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database connection pool error
    #[error("Database connection error")]
    ConnectionPool(#[source] PoolError),

    /// Database query error
    #[error("Database error: {0}")]
    Database(#[from] DieselError),

    /// Storage or other unexpected failure
    #[error("{0}")]
    Internal(anyhow::Error),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The request raced with another change; the client should re-fetch
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    /// Create a not found error with a custom message
    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(DieselError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(DieselError::DatabaseError(kind, _)) => match kind {
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::CheckViolation => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        ApiError::ConnectionPool(err)
    }
}

/// The db layer reports through `anyhow`; recover the typed error when there
/// is one so constraint failures surface as client errors and pool failures
/// as 503.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<DieselError>() {
            Ok(diesel_err) => return ApiError::Database(diesel_err),
            Err(err) => err,
        };
        let err = match err.downcast::<PoolError>() {
            Ok(pool_err) => return ApiError::ConnectionPool(pool_err),
            Err(err) => err,
        };
        match err.downcast::<StaleBlock>() {
            Ok(stale) => ApiError::Conflict(format!("{}, reload the day", stale)),
            Err(err) => ApiError::Internal(err),
        }
    }
}

impl From<LayoutError> for ApiError {
    fn from(err: LayoutError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        match err {
            PlannerError::Layout(layout) => layout.into(),
            PlannerError::WorkspaceNotFound(_) => ApiError::not_found("Workspace"),
            PlannerError::ProjectNotFound(_) => ApiError::not_found("Project"),
            PlannerError::BlockNotFound(_) => ApiError::not_found("Day block"),
            PlannerError::Invalid(msg) => ApiError::BadRequest(msg),
            PlannerError::Storage(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_message, details) = match &self {
            ApiError::ConnectionPool(e) => {
                tracing::error!("Connection pool error: {:?}", e);
                ("Database connection unavailable".to_string(), None)
            }
            ApiError::Database(e) => {
                match e {
                    DieselError::NotFound => ("Resource not found".to_string(), None),
                    DieselError::DatabaseError(kind, info) if status == StatusCode::BAD_REQUEST => {
                        tracing::warn!("Constraint violation ({:?}): {}", kind, info.message());
                        (
                            "Request conflicts with existing data".to_string(),
                            Some(info.message().to_string()),
                        )
                    }
                    _ => {
                        tracing::error!("Database error: {:?}", e);
                        ("Database operation failed".to_string(), None)
                    }
                }
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                ("Internal server error".to_string(), None)
            }
            ApiError::NotFound(resource) => (format!("{} not found", resource), None),
            ApiError::BadRequest(msg) => (msg.clone(), None),
            ApiError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (msg.clone(), None)
            }
            ApiError::Unauthorized(msg) => (msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_layout_errors_are_bad_requests() {
        let err: ApiError = LayoutError::GapOrOverlap {
            end_hour: 14,
            next_start_hour: 15,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("gap or overlap"));
    }

    #[test]
    fn test_planner_not_found_maps_to_404() {
        let err: ApiError = PlannerError::BlockNotFound(Uuid::new_v4()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = PlannerError::WorkspaceNotFound(Uuid::new_v4()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_anyhow_wrapping_diesel_not_found() {
        let err: ApiError = anyhow::Error::from(DieselError::NotFound).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_plain_anyhow_is_internal() {
        let err: ApiError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_pool_failure_through_get_conn_is_503() {
        use anyhow::Context;

        let err: ApiError = Err::<(), _>(PoolError::Closed)
            .context("Failed to get connection")
            .unwrap_err()
            .into();
        assert!(matches!(err, ApiError::ConnectionPool(_)));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_stale_block_during_retime_is_409() {
        let err: ApiError =
            PlannerError::Storage(anyhow::Error::new(StaleBlock(Uuid::new_v4()))).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("no longer exists"));
    }

    #[test]
    fn test_unauthorized_status() {
        let response = ApiError::unauthorized("Unauthorized").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

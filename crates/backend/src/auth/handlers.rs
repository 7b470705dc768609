//! Authentication HTTP handlers.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use planner_types::{
    AuthResponse, PasswordLoginRequest, PinRequest, PinStatusResponse, SuccessResponse,
};
use sha2::{Digest, Sha256};

use crate::db::{auth_pin, get_conn};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::middleware::{build_auth_cookie, clear_auth_cookie, has_valid_session};
use super::{jwt, types::LoginMethod};

pub const MIN_PIN_LENGTH: usize = 4;

/// Lowercase hex SHA-256 of `secret`.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Issue a session for `method` and attach it as a cookie.
fn session_response(
    state: &AppState,
    method: LoginMethod,
    body: AuthResponse,
) -> ApiResult<Response> {
    let config = &state.auth_config;
    let token = jwt::create_token(config, method)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))?;
    let cookie = build_auth_cookie(config, &token, method.session_days());

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(body),
    )
        .into_response())
}

/// Whether a PIN has been set up yet.
pub async fn pin_status(State(state): State<AppState>) -> ApiResult<Json<PinStatusResponse>> {
    let mut conn = get_conn(&state.pool).await?;
    let stored = auth_pin::get_hash(&mut conn).await?;

    Ok(Json(PinStatusResponse {
        has_pin: stored.is_some(),
    }))
}

#[derive(Debug, PartialEq, Eq)]
enum PinAction {
    Setup,
    Verify,
}

/// Decide what a PIN request does. The first PIN can be set freely; replacing
/// an existing one needs a live session.
fn pin_action(has_pin: bool, wants_setup: bool, has_session: bool) -> ApiResult<PinAction> {
    match (has_pin, wants_setup) {
        (false, _) => Ok(PinAction::Setup),
        (true, false) => Ok(PinAction::Verify),
        (true, true) if has_session => Ok(PinAction::Setup),
        (true, true) => Err(ApiError::unauthorized(
            "Changing the PIN requires an active session",
        )),
    }
}

/// Set up the PIN on first use (or on `setup` from a logged-in session),
/// otherwise verify it.
pub async fn pin_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PinRequest>,
) -> ApiResult<Response> {
    if payload.pin.chars().count() < MIN_PIN_LENGTH {
        return Err(ApiError::bad_request(format!(
            "PIN must be at least {} characters",
            MIN_PIN_LENGTH
        )));
    }

    let mut conn = get_conn(&state.pool).await?;
    let stored = auth_pin::get_hash(&mut conn).await?;
    let digest = hash_secret(&payload.pin);

    let action = pin_action(
        stored.is_some(),
        payload.action.as_deref() == Some("setup"),
        has_valid_session(&headers, &state.auth_config),
    )
    .inspect_err(|_| tracing::warn!("Rejected PIN change without a session"))?;

    match action {
        PinAction::Verify => {
            if stored.as_deref() != Some(digest.as_str()) {
                tracing::warn!("PIN verification failed");
                return Err(ApiError::unauthorized("Invalid PIN"));
            }
            tracing::info!("PIN login");
            session_response(
                &state,
                LoginMethod::Pin,
                AuthResponse {
                    success: true,
                    action: Some("login".to_string()),
                },
            )
        }
        PinAction::Setup => {
            auth_pin::set_hash(&mut conn, &digest).await?;
            tracing::info!("PIN set up");
            session_response(
                &state,
                LoginMethod::Pin,
                AuthResponse {
                    success: true,
                    action: Some("setup".to_string()),
                },
            )
        }
    }
}

/// Log in with the configured password.
pub async fn password_login(
    State(state): State<AppState>,
    Json(payload): Json<PasswordLoginRequest>,
) -> ApiResult<Response> {
    let expected = state
        .auth_config
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Password login is not configured"))?;

    if hash_secret(&payload.password) != expected {
        tracing::warn!("Password login failed");
        return Err(ApiError::unauthorized("Invalid password"));
    }

    tracing::info!("Password login");
    session_response(
        &state,
        LoginMethod::Password,
        AuthResponse {
            success: true,
            action: None,
        },
    )
}

/// Logout - clear session cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_auth_cookie(&state.auth_config);

    (
        [(header::SET_COOKIE, cookie)],
        Json(SuccessResponse { success: true }),
    )
}

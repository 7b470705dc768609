//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::AppState;

use super::jwt;
use super::types::AuthConfig;

/// Reject requests without a valid session.
///
/// Used with `axum::middleware::from_fn_with_state` on the `/api` router.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.auth_config;

    let token = match extract_token(request.headers(), config) {
        Some(t) => t,
        None => return ApiError::unauthorized("Missing authentication").into_response(),
    };

    if let Err(e) = jwt::validate_token(config, &token) {
        tracing::debug!("Rejected session token: {}", e);
        return ApiError::unauthorized("Invalid or expired session").into_response();
    }

    next.run(request).await
}

/// Whether the request carries a session token that still validates.
pub fn has_valid_session(headers: &HeaderMap, config: &AuthConfig) -> bool {
    extract_token(headers, config)
        .map(|token| jwt::validate_token(config, &token).is_ok())
        .unwrap_or(false)
}

/// Session token from the cookie, falling back to `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    extract_token_from_cookie(headers, &config.cookie_name)
        .or_else(|| extract_token_from_header(headers))
}

fn extract_token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie_str in cookie_header.split(';') {
        if let Ok(cookie) = cookie::Cookie::parse(cookie_str.trim()) {
            if cookie.name() == cookie_name && !cookie.value().is_empty() {
                return Some(cookie.value().to_string());
            }
        }
    }

    None
}

fn extract_token_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.to_string())
}

/// Build a session cookie string.
pub fn build_auth_cookie(config: &AuthConfig, value: &str, days: i64) -> String {
    let max_age = days * 24 * 60 * 60;
    let secure = if config.secure_cookie { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        config.cookie_name, value, max_age, secure
    )
}

/// Cookie string that expires the session immediately.
pub fn clear_auth_cookie(config: &AuthConfig) -> String {
    build_auth_cookie(config, "", 0)
}

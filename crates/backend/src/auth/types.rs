//! Session claims and auth configuration.

use serde::{Deserialize, Serialize};

/// How a session was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Pin,
    Password,
}

impl LoginMethod {
    /// Session lifetime granted by this login method.
    pub fn session_days(self) -> i64 {
        match self {
            LoginMethod::Pin => 30,
            LoginMethod::Password => 7,
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Always "owner"; the planner has a single user
    pub sub: String,
    pub method: LoginMethod,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Auth configuration loaded from environment
#[derive(Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    /// SHA-256 hex digest of the login password. Password login is disabled
    /// when unset.
    pub password_hash: Option<String>,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// Required env vars:
    /// - `AUTH_SECRET`: Secret key for signing session tokens
    ///
    /// Optional env vars:
    /// - `AUTH_PASSWORD_HASH`: SHA-256 hex of the login password
    /// - `RUST_ENV`: `production` marks the cookie `Secure`
    pub fn from_env() -> Result<Self, String> {
        let session_secret =
            std::env::var("AUTH_SECRET").map_err(|_| "AUTH_SECRET must be set".to_string())?;
        if session_secret.is_empty() {
            return Err("AUTH_SECRET cannot be empty".to_string());
        }

        let password_hash = std::env::var("AUTH_PASSWORD_HASH")
            .ok()
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty());

        Ok(Self {
            session_secret,
            password_hash,
            cookie_name: "dtdt-session".to_string(),
            secure_cookie: std::env::var("RUST_ENV").unwrap_or_default() == "production",
        })
    }
}

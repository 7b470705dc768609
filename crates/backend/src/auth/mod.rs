//! Session auth for the single planner owner.
//!
//! This module provides:
//! - PIN setup/verification and password login handlers
//! - HS256 session tokens carried in the `dtdt-session` cookie
//! - `require_auth` middleware for protecting routes

mod handlers;
mod jwt;
mod middleware;
pub mod types;

pub use handlers::{logout, password_login, pin_auth, pin_status};
pub use middleware::require_auth;

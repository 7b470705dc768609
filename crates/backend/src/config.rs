use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Connect to Postgres over rustls. Hosted databases need this; a local
    /// socket usually does not.
    pub database_tls: bool,
    pub database_pool_size: usize,
    pub port: u16,
    pub frontend_dir: String,
    pub cors_allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_tls: parse_flag(env::var("DATABASE_TLS").ok().as_deref(), true)
                .context("DATABASE_TLS must be true or false")?,
            database_pool_size: env::var("DATABASE_POOL_SIZE")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .context("DATABASE_POOL_SIZE must be a valid number")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            frontend_dir: env::var("FRONTEND_DIR").unwrap_or_else(|_| "frontend/dist".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),
        })
    }
}

fn parse_flag(value: Option<&str>, default: bool) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("unrecognised flag value {:?}", other),
        },
    }
}

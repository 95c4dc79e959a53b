//! Environment configuration
//!
//! Values come from process environment variables (a `.env` file is loaded by
//! `main` through dotenvy). Only `JWT_SECRET` is mandatory here.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub jwt_expiration: u64,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
    /// Upper bound on every entity store call
    pub store_timeout: Duration,
    /// Extra attempts for a lifecycle transition that lost an optimistic write race
    pub transition_retries: u32,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET must be set"))?;

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 3000)?,
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", 86_400)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| split_origins(&origins))
                .unwrap_or_default(),
            store_timeout: Duration::from_millis(parse_var("STORE_TIMEOUT_MS", 5_000)?),
            transition_retries: parse_var("TRANSITION_RETRIES", 3)?,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }

    /// Local defaults with an explicit secret. Used by tests and tooling.
    pub fn development(jwt_secret: impl Into<String>) -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: jwt_secret.into(),
            jwt_expiration: 3_600,
            cors_origins: Vec::new(),
            store_timeout: Duration::from_secs(5),
            transition_retries: 3,
            admin_email: None,
            admin_password: None,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

//! Environment Configuration

use taskbox_core::error::{AppError, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite://taskbox.db";
const DEFAULT_QUEUE_URL: &str = "memory://taskbox";
const DEFAULT_SERVICE_NAME: &str = "taskbox";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_VERSION: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub queue_url: String,
    pub secret_key: String,
    pub users_url: String,
    pub service_name: String,
    pub port: u16,
    pub api_version: String,
    pub production: bool,
}

impl Config {
    /// Read configuration from `TASKBOX_*` environment variables.
    /// The signing secret and the user-service URL have no sane defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: var_or("TASKBOX_DATABASE_URL", DEFAULT_DATABASE_URL),
            queue_url: var_or("TASKBOX_QUEUE_URL", DEFAULT_QUEUE_URL),
            secret_key: required_var("TASKBOX_SECRET_KEY")?,
            users_url: required_var("TASKBOX_USERS_URL")?,
            service_name: var_or("TASKBOX_SERVICE_NAME", DEFAULT_SERVICE_NAME),
            port: std::env::var("TASKBOX_PORT")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            api_version: var_or("TASKBOX_API_VERSION", DEFAULT_API_VERSION),
            production: parse_bool(std::env::var("TASKBOX_PRODUCTION").ok().as_deref()),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{name} must be set")))
}

fn parse_bool(raw: Option<&str>) -> bool {
    matches!(
        raw.map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

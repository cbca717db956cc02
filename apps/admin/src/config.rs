use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_CREDENTIALS_PATH: &str = ".resumeit-admin/credentials.json";

/// Console configuration loaded from environment variables.
/// Only the API base URL addresses the backend; the rest is local plumbing.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub credentials_path: PathBuf,
    pub http_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        Ok(Config {
            api_base_url: normalize_base_url(&api_base_url)?,
            credentials_path: std::env::var("ADMIN_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CREDENTIALS_PATH)),
            http_timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse::<u64>()
                    .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Strips trailing slashes so endpoint paths can always start with `/`.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed)
        .with_context(|| format!("API_BASE_URL '{raw}' is not a valid URL"))?;
    Ok(trimmed.to_string())
}

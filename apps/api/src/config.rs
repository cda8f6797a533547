use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_AGENT_API_URL: &str = "http://localhost:3000";
const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the service runs on the
    /// in-memory document store.
    pub database_url: Option<String>,
    pub agent_api_url: String,
    pub agent_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let agent_timeout_secs = match optional_env("AGENT_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("AGENT_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_AGENT_TIMEOUT_SECS,
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            agent_api_url: optional_env("AGENT_API_URL")
                .unwrap_or_else(|| DEFAULT_AGENT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            agent_timeout: Duration::from_secs(agent_timeout_secs),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

//! Ingestor configuration from environment variables

use std::env;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Base URL of the chain API
    pub chain_api_url: String,

    /// Time between poll cycles
    pub poll_interval: Duration,

    /// Per-call deadline for remote fetches
    pub request_timeout: Duration,

    /// Path to the SQLite metrics database
    pub db_path: String,

    /// Path to the JSONL audit trail
    pub events_path: String,
}

impl IngestConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `CHAIN_API_URL` (required, must start with http:// or https://)
    /// - `POLL_INTERVAL_SECS` (default: 5)
    /// - `REQUEST_TIMEOUT_SECS` (default: 10)
    /// - `METRICS_DB_PATH` (default: data/metrics.db)
    /// - `EVENTS_JSONL_PATH` (default: data/events.jsonl)
    pub fn from_env() -> Result<Self, ConfigError> {
        let chain_api_url = env::var("CHAIN_API_URL")
            .map_err(|_| ConfigError::MissingVariable("CHAIN_API_URL".to_string()))?;

        if !chain_api_url.starts_with("http://") && !chain_api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "CHAIN_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let poll_interval_secs = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5);

        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let db_path = env::var("METRICS_DB_PATH").unwrap_or_else(|_| "data/metrics.db".to_string());

        let events_path =
            env::var("EVENTS_JSONL_PATH").unwrap_or_else(|_| "data/events.jsonl".to_string());

        Ok(Self {
            chain_api_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            db_path,
            events_path,
        })
    }
}

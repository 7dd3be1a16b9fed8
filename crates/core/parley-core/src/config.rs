//! Configuration management and environment variable loading

use crate::{ParleyError, Result};
use std::env;
use std::time::Duration;

/// Environment variable naming the chat API base URL
pub const API_URL_ENV: &str = "PARLEY_API_URL";

/// Environment variable for the request timeout in seconds
pub const TIMEOUT_ENV: &str = "PARLEY_TIMEOUT_SECS";

/// Environment variable for the number of prior turns sent as history
pub const HISTORY_WINDOW_ENV: &str = "PARLEY_HISTORY_WINDOW";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Base URL captured from the build environment, if it was set at compile time
const BUILD_API_URL: Option<&str> = option_env!("PARLEY_API_URL");

/// Load environment variables from .env file
///
/// Safe to call more than once. A missing file is not an error.
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(ParleyError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(ParleyError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Read an environment variable as a number, falling back on absence or a parse failure
fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Connection settings for the remote chat service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL; `/chat` and `/health` are appended to it
    pub base_url: String,

    /// Bound on a single request, connect included
    pub timeout: Duration,

    /// Number of prior user/assistant turns sent as `history`
    pub history_window: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            history_window: 0,
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment.
    ///
    /// The base URL comes from `PARLEY_API_URL` at runtime, then the same
    /// variable as seen at build time, then the localhost default.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(None, None)
    }

    /// Like [`ClientConfig::from_env`], but explicit values win over the
    /// environment and the environment copy is never validated.
    pub fn from_env_with(base_url: Option<String>, timeout_secs: Option<u64>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(API_URL_ENV).ok())
            .filter(|v| !v.trim().is_empty())
            .or_else(|| BUILD_API_URL.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_secs =
            timeout_secs.unwrap_or_else(|| get_env_int(TIMEOUT_ENV, DEFAULT_TIMEOUT_SECS));

        Ok(Self::default()
            .with_base_url(base_url)?
            .with_timeout(Duration::from_secs(timeout_secs))?
            .with_history_window(get_env_int(HISTORY_WINDOW_ENV, 0usize)))
    }

    /// Replace the base URL after validating it
    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        Self::validate_url(&url)?;
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Replace the request timeout; zero is rejected
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(ParleyError::config("Request timeout must be greater than zero"));
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Replace the history window
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Full URL of the chat endpoint
    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }

    /// Full URL of the health endpoint
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// Validate URL format
    pub fn validate_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(ParleyError::config("Base URL cannot be empty"));
        }

        if url.len() > 2048 {
            return Err(ParleyError::config("URL is too long (max 2048 characters)"));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ParleyError::config(format!(
                "Invalid URL format: '{}'. Must start with http:// or https://",
                url
            )));
        }

        reqwest::Url::parse(url)
            .map_err(|e| ParleyError::config(format!("Invalid URL '{}': {}", url, e)))?;

        Ok(())
    }
}

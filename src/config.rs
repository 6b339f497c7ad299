//! Configuration management for todo-chat.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `TASK_API_BASE_URL` - Optional. Base URL of the task API. Defaults to `http://localhost:8000/api/v1`.
//! - `TASK_API_TIMEOUT_SECS` - Optional. Request timeout for task API calls. Defaults to `30`.
//! - `GEMINI_API_KEY` - Optional. Key for the generative fallback. Without it the fallback is disabled.
//! - `GEMINI_MODEL` - Optional. Fallback model. Defaults to `gemini-1.5-flash`.
//! - `GEMINI_API_BASE_URL` - Optional. Defaults to `https://generativelanguage.googleapis.com/v1beta`.
//! - `GEMINI_TIMEOUT_SECS` - Optional. Request timeout for fallback calls. Defaults to `60`.
//! - `MAX_CONVERSATIONS` - Optional. Conversations kept in memory before the least recently updated is dropped. Defaults to `1000`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::conversation::DEFAULT_MAX_CONVERSATIONS;

pub const DEFAULT_TASK_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Remote task API configuration.
#[derive(Debug, Clone)]
pub struct TaskApiConfig {
    /// Base URL; task paths (`/tasks`, `/tasks/{id}`) are appended to it
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for TaskApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TASK_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Generative-text fallback configuration.
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// API key (secret, never logged)
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl FallbackConfig {
    /// Check if the fallback can be called at all.
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Task API configuration
    pub task_api: TaskApiConfig,

    /// Generative fallback configuration
    pub fallback: FallbackConfig,

    /// Conversations kept in memory
    pub max_conversations: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric value does not parse or
    /// a base URL is not an absolute http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "127.0.0.1");

        let port = parse_var("PORT", &env_or("PORT", "3000"))?;

        let base_url = validate_base_url(
            "TASK_API_BASE_URL",
            &env_or("TASK_API_BASE_URL", DEFAULT_TASK_API_BASE_URL),
        )?;
        let timeout_secs: u64 =
            parse_var("TASK_API_TIMEOUT_SECS", &env_or("TASK_API_TIMEOUT_SECS", "30"))?;

        let fallback_timeout_secs: u64 =
            parse_var("GEMINI_TIMEOUT_SECS", &env_or("GEMINI_TIMEOUT_SECS", "60"))?;
        let fallback = FallbackConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            base_url: validate_base_url(
                "GEMINI_API_BASE_URL",
                &env_or("GEMINI_API_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            )?,
            timeout: Duration::from_secs(fallback_timeout_secs),
        };

        let max_conversations: usize = parse_var(
            "MAX_CONVERSATIONS",
            &env_or("MAX_CONVERSATIONS", &DEFAULT_MAX_CONVERSATIONS.to_string()),
        )?;
        if max_conversations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_CONVERSATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            task_api: TaskApiConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            fallback,
            max_conversations,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(task_api_base_url: String, gemini_api_key: Option<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            task_api: TaskApiConfig {
                base_url: task_api_base_url,
                ..TaskApiConfig::default()
            },
            fallback: FallbackConfig {
                api_key: gemini_api_key,
                ..FallbackConfig::default()
            },
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue(var.to_string(), format!("{}", e)))
}

/// Check that `value` is an absolute http(s) URL and strip any trailing slash.
fn validate_base_url(var: &str, value: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidValue(var.to_string(), format!("{}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("unsupported scheme: {}", parsed.scheme()),
        ));
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}

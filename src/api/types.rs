//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tools::{ToolCall, ToolResult};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Existing conversation to continue; a new id is minted when absent
    #[serde(default)]
    pub conversation_id: Option<String>,

    pub message: String,

    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_user_id() -> String {
    "default_user".to_string()
}

/// Reply to `POST /api/chat`, for successes and failures alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    pub timestamp: DateTime<Utc>,
}

impl ChatResponse {
    /// Apology body for requests that never reached the agent.
    pub fn apology(reason: impl std::fmt::Display) -> Self {
        Self {
            conversation_id: String::new(),
            response: format!(
                "Sorry, I encountered an error processing your request: {}",
                reason
            ),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

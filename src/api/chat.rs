//! Chat endpoint handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::routes::AppState;
use super::types::{ChatRequest, ChatResponse, HealthResponse};
use crate::conversation::{ChatMessage, Conversation};
use crate::tools::ToolInfo;

/// POST /api/chat: run one turn and log it to the conversation.
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> (StatusCode, Json<ChatResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected chat request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ChatResponse::apology(rejection.body_text())),
            );
        }
    };

    let message = req.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatResponse::apology("message is required")),
        );
    }

    let requested_id = req
        .conversation_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let conversation_id = match state.conversations.open(requested_id, &req.user_id).await {
        Ok(id) => id,
        Err(e) => return (StatusCode::FORBIDDEN, Json(ChatResponse::apology(e))),
    };

    let turn = state.agent.respond(message).await;
    tracing::info!(
        conversation_id = %conversation_id,
        intent = turn.intent.map(|i| i.as_str()).unwrap_or("fallback"),
        errored = turn.errored,
        "Chat turn complete"
    );

    if let Err(e) = state
        .conversations
        .append(
            &conversation_id,
            &req.user_id,
            [
                ChatMessage::user(message),
                ChatMessage::assistant(turn.response.clone(), turn.errored),
            ],
        )
        .await
    {
        tracing::warn!(conversation_id = %conversation_id, error = %e, "Turn not logged");
    }

    (
        StatusCode::OK,
        Json(ChatResponse {
            conversation_id,
            response: turn.response,
            tool_calls: turn.tool_calls,
            tool_results: turn.tool_results,
            timestamp: Utc::now(),
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub user_id: String,
}

/// GET /api/conversations/:id?user_id=..
///
/// Conversations of other users read as missing.
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Conversation>, (StatusCode, String)> {
    state
        .conversations
        .get_for(&id, &query.user_id)
        .await
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Conversation {} not found", id)))
}

/// GET /api/tools
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolInfo>> {
    Json(state.agent.tools().list_tools())
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ChatAgent;
    use crate::llm::{LlmClient, LlmError};
    use crate::store::InMemoryTaskStore;
    use async_trait::async_trait;

    struct NoFallback;

    #[async_trait]
    impl LlmClient for NoFallback {
        async fn generate(&self, _: &str) -> Result<String, LlmError> {
            Err(LlmError::NotConfigured)
        }
    }

    fn state() -> Arc<AppState> {
        let agent = ChatAgent::new(Arc::new(InMemoryTaskStore::new()), Arc::new(NoFallback));
        Arc::new(AppState::new(agent))
    }

    fn request(
        conversation_id: Option<&str>,
        message: &str,
        user_id: &str,
    ) -> Result<Json<ChatRequest>, JsonRejection> {
        Ok(Json(ChatRequest {
            conversation_id: conversation_id.map(str::to_string),
            message: message.to_string(),
            user_id: user_id.to_string(),
        }))
    }

    fn owner(user_id: &str) -> Query<ConversationQuery> {
        Query(ConversationQuery {
            user_id: user_id.to_string(),
        })
    }

    #[tokio::test]
    async fn empty_message_is_bad_request() {
        let (status, Json(body)) = post_chat(State(state()), request(None, "   ", "tester")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.conversation_id, "");
        assert_eq!(
            body.response,
            "Sorry, I encountered an error processing your request: message is required"
        );
        assert!(body.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn turn_is_logged_under_minted_id() {
        let state = state();
        let (status, Json(body)) =
            post_chat(State(state.clone()), request(None, "Add a task to water plants", "tester")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.conversation_id.starts_with("conv_"));
        assert_eq!(body.tool_results.len(), 1);

        let Json(conv) = get_conversation(
            State(state.clone()),
            Path(body.conversation_id.clone()),
            owner("tester"),
        )
        .await
        .unwrap();
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.user_id, "tester");
        assert_eq!(conv.messages[1].content, body.response);
    }

    #[tokio::test]
    async fn conversations_stay_with_their_owner() {
        let state = state();
        let (_, Json(first)) =
            post_chat(State(state.clone()), request(None, "Show my tasks", "alice")).await;
        let (_, Json(second)) =
            post_chat(State(state.clone()), request(None, "Show my tasks", "bob")).await;
        assert_ne!(first.conversation_id, second.conversation_id);

        let (status, Json(body)) = post_chat(
            State(state.clone()),
            request(Some(&first.conversation_id), "Show my tasks", "bob"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.conversation_id, "");
        assert!(body.tool_calls.is_empty());

        let err = get_conversation(
            State(state.clone()),
            Path(first.conversation_id.clone()),
            owner("bob"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let Json(conv) = get_conversation(State(state), Path(first.conversation_id), owner("alice"))
            .await
            .unwrap();
        assert_eq!(conv.messages.len(), 2);
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let err = get_conversation(State(state()), Path("nope".to_string()), owner("tester"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_and_health() {
        let Json(tools) = list_tools(State(state())).await;
        assert_eq!(tools.len(), 7);
        let Json(health) = health().await;
        assert_eq!(health.status, "ok");
    }
}

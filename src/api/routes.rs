//! Router, shared state and server startup.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::chat;
use crate::agent::ChatAgent;
use crate::config::Config;
use crate::conversation::InMemoryConversationStore;

/// Shared application state.
pub struct AppState {
    pub agent: ChatAgent,
    pub conversations: InMemoryConversationStore,
}

impl AppState {
    pub fn new(agent: ChatAgent) -> Self {
        Self {
            agent,
            conversations: InMemoryConversationStore::new(),
        }
    }
}

/// Build the `/api` router around `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat::post_chat))
        .route("/api/conversations/:id", get(chat::get_conversation))
        .route("/api/tools", get(chat::list_tools))
        .route("/api/health", get(chat::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.host:config.port` and serve until the process exits.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agent = ChatAgent::from_config(&config)?;
    tracing::info!(
        task_api = %config.task_api.base_url,
        fallback_model = %config.fallback.model,
        fallback_enabled = config.fallback.is_enabled(),
        "Chat agent ready"
    );
    let state = AppState {
        agent,
        conversations: InMemoryConversationStore::with_capacity(config.max_conversations),
    };
    let app = router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

//! In-memory conversation log (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Longest title derived from a conversation's first message, in chars.
const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, MessageStatus::Sent)
    }

    /// Assistant reply; `errored` marks turns that ended in a failure.
    pub fn assistant(content: impl Into<String>, errored: bool) -> Self {
        let status = if errored {
            MessageStatus::Error
        } else {
            MessageStatus::Delivered
        };
        Self::new(MessageRole::Assistant, content, status)
    }

    fn new(role: MessageRole, content: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Conversation {
    fn new(id: &str, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "New conversation".to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    fn push(&mut self, message: ChatMessage) {
        if self.messages.is_empty() && message.role == MessageRole::User {
            self.title = derive_title(&message.content);
        }
        self.updated_at = message.timestamp;
        self.messages.push(message);
    }
}

fn derive_title(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    format!("{}...", head.trim_end())
}

/// Conversations kept when no limit is configured.
pub const DEFAULT_MAX_CONVERSATIONS: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("conversation {0} belongs to another user")]
    NotOwner(String),
}

/// Conversations keyed by id. Messages are only ever appended; once the store
/// is full, starting a conversation evicts the least recently updated one.
#[derive(Clone)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<String, Conversation>>>,
    capacity: usize,
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CONVERSATIONS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.read().await.get(id).cloned()
    }

    /// Conversation `id` if `user_id` owns it.
    pub async fn get_for(&self, id: &str, user_id: &str) -> Option<Conversation> {
        self.get(id).await.filter(|c| c.user_id == user_id)
    }

    /// Resolve the conversation a turn belongs to.
    ///
    /// A given id is created on first use and must belong to `user_id`. Without
    /// one, a fresh `conv_<unix-millis>` id is minted, stepping past ids that
    /// are already taken.
    pub async fn open(&self, id: Option<&str>, user_id: &str) -> Result<String, ConversationError> {
        let mut conversations = self.conversations.write().await;
        let id = match id {
            Some(id) => {
                if let Some(existing) = conversations.get(id) {
                    if existing.user_id != user_id {
                        tracing::warn!(conversation_id = %id, user_id = %user_id, "Conversation owned by another user");
                        return Err(ConversationError::NotOwner(id.to_string()));
                    }
                    return Ok(id.to_string());
                }
                id.to_string()
            }
            None => {
                let mut millis = Utc::now().timestamp_millis();
                while conversations.contains_key(&format!("conv_{}", millis)) {
                    tracing::debug!(millis, "Conversation id taken, stepping forward");
                    millis += 1;
                }
                format!("conv_{}", millis)
            }
        };
        self.insert_new(&mut conversations, &id, user_id);
        Ok(id)
    }

    /// Append messages to a conversation owned by `user_id`, recreating it
    /// if it was evicted in the meantime.
    pub async fn append(
        &self,
        id: &str,
        user_id: &str,
        messages: impl IntoIterator<Item = ChatMessage>,
    ) -> Result<Conversation, ConversationError> {
        let mut conversations = self.conversations.write().await;
        if !conversations.contains_key(id) {
            self.insert_new(&mut conversations, id, user_id);
        }
        let conversation = match conversations.get_mut(id) {
            Some(c) if c.user_id == user_id => c,
            _ => return Err(ConversationError::NotOwner(id.to_string())),
        };
        for message in messages {
            conversation.push(message);
        }
        Ok(conversation.clone())
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    fn insert_new(&self, conversations: &mut HashMap<String, Conversation>, id: &str, user_id: &str) {
        while conversations.len() >= self.capacity {
            let Some(oldest) = conversations
                .values()
                .min_by_key(|c| c.updated_at)
                .map(|c| c.id.clone())
            else {
                break;
            };
            tracing::debug!(conversation_id = %oldest, "Evicting least recently updated conversation");
            conversations.remove(&oldest);
        }
        tracing::debug!(conversation_id = %id, user_id = %user_id, "Starting conversation");
        conversations.insert(id.to_string(), Conversation::new(id, user_id));
    }
}

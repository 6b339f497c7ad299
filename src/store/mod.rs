//! Task store abstraction.
//!
//! The authoritative task list lives in a remote task API. `HttpTaskStore`
//! talks to it; `InMemoryTaskStore` is a non-persistent stand-in for tests
//! and local runs without a backend.

mod http;
mod memory;

pub use http::HttpTaskStore;
pub use memory::InMemoryTaskStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::task::{NewTask, Task, TaskFilter, TaskPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The API answered with a non-2xx status.
    #[error("{detail}")]
    Api { status: u16, detail: String },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("Task {0} not found")]
    NotFound(String),
}

impl StoreError {
    /// HTTP status of the failure, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// CRUD access to the task collection.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    async fn get(&self, id: &str) -> Result<Task, StoreError>;

    async fn create(&self, task: &NewTask) -> Result<Task, StoreError>;

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Flip a task between completed and pending.
    async fn toggle(&self, id: &str) -> Result<Task, StoreError> {
        let task = self.get(id).await?;
        self.update(id, &TaskPatch::status(task.status.toggled()))
            .await
    }
}

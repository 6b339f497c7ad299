//! HTTP client for the remote task API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{StoreError, TaskStore};
use crate::config::TaskApiConfig;
use crate::task::{NewTask, Task, TaskFilter, TaskPatch};

/// Task store backed by `{base_url}/tasks`.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: Client,
    base_url: String,
}

impl HttpTaskStore {
    /// Build a client from the task API configuration.
    pub fn new(config: &TaskApiConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("todo-chat/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/tasks/{}", self.base_url, urlencoding::encode(id))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        tracing::debug!(status = status.as_u16(), detail = %detail, "Task API returned an error");
        Err(StoreError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body.
///
/// FastAPI-style bodies use `detail` (a string, or a list of validation
/// errors); others use `message`.
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let field = value.get("detail").or_else(|| value.get("message"))?;
    match field {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Null | Value::String(_) => None,
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            if messages.is_empty() {
                Some(field.to_string())
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let request = self
            .client
            .get(self.collection_url())
            .query(&filter.query_pairs());
        self.send_json(request).await
    }

    async fn get(&self, id: &str) -> Result<Task, StoreError> {
        self.send_json(self.client.get(self.task_url(id))).await
    }

    async fn create(&self, task: &NewTask) -> Result<Task, StoreError> {
        self.send_json(self.client.post(self.collection_url()).json(task))
            .await
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, StoreError> {
        self.send_json(self.client.put(self.task_url(id)).json(patch))
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.send(self.client.delete(self.task_url(id))).await?;
        Ok(())
    }
}

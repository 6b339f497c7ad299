//! One chat turn: extract, resolve, dispatch, compose.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::intent::{Intent, IntentExtractor};
use crate::llm::{GeminiClient, LlmClient, LlmError};
use crate::store::{HttpTaskStore, TaskStore};
use crate::task::{Task, TaskFilter};
use crate::tools::{ToolCall, ToolRegistry, ToolResult};

use super::compose::compose;
use super::dialogue::plan;
use super::prompt::build_fallback_prompt;

/// Everything one message produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Matched intent, `None` when the fallback answered
    pub intent: Option<Intent>,
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    /// A tool failed or the fallback could not answer
    pub errored: bool,
}

/// An untyped `{type, params}` call as submitted by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawToolCall {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(default)]
    pub params: Value,
}

/// The chat agent. Stateless between turns.
pub struct ChatAgent {
    extractor: IntentExtractor,
    tools: ToolRegistry,
    llm: Arc<dyn LlmClient>,
}

impl ChatAgent {
    pub fn new(store: Arc<dyn TaskStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            extractor: IntentExtractor::new(),
            tools: ToolRegistry::new(store),
            llm,
        }
    }

    /// Agent wired to the HTTP task API and Gemini from `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = HttpTaskStore::new(&config.task_api)?;
        let llm = GeminiClient::new(&config.fallback)?;
        if !config.fallback.is_enabled() {
            tracing::warn!("GEMINI_API_KEY not set; unmatched messages will get an apology");
        }
        Ok(Self::new(Arc::new(store), Arc::new(llm)))
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one user message. Never fails; every problem ends up in the
    /// returned text.
    pub async fn respond(&self, message: &str) -> Turn {
        let extraction = self.extractor.extract(message);
        let Some(intent) = extraction.intent else {
            return self.fallback(message).await;
        };

        let tasks = if intent.references_task() {
            self.current_tasks().await
        } else {
            Vec::new()
        };

        let plan = plan(intent, &extraction.entities, &tasks);
        tracing::info!(
            intent = %intent,
            tool_calls = plan.tool_calls.len(),
            "Planned chat turn"
        );

        let tool_results = self.execute(&plan.tool_calls).await;
        let composed = compose(&plan.response, &tool_results);

        Turn {
            intent: Some(intent),
            response: composed.response,
            tool_calls: plan.tool_calls,
            tool_results,
            errored: composed.errored,
        }
    }

    /// Run calls one after another, in order.
    pub async fn execute(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.tools.dispatch(call).await);
        }
        results
    }

    /// Run untyped calls in order. Calls naming no registered tool, or with
    /// unusable params, are logged and produce no result.
    pub async fn execute_raw(&self, calls: &[RawToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            match self.tools.dispatch_raw(&call.name, call.params.clone()).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(tool = %call.name, error = %e, "Dropping tool call");
                }
            }
        }
        results
    }

    /// Task list for title resolution. A failed listing resolves nothing.
    async fn current_tasks(&self) -> Vec<Task> {
        match self.tools.store().list(&TaskFilter::default()).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch tasks for title lookup");
                Vec::new()
            }
        }
    }

    async fn fallback(&self, message: &str) -> Turn {
        let prompt = build_fallback_prompt(message, &self.tools);
        let (response, errored) = match self.llm.generate(&prompt).await {
            Ok(text) => (text, false),
            Err(LlmError::Empty) => (
                format!(
                    "I received your message: \"{}\". How else can I help with your todos?",
                    message
                ),
                false,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Generative fallback failed");
                (
                    format!(
                        "Sorry, I encountered an error processing your request: {}",
                        e
                    ),
                    true,
                )
            }
        };
        Turn {
            intent: None,
            response,
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            errored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryTaskStore, StoreError};
    use crate::task::{NewTask, Priority, TaskPatch, TaskStatus};
    use crate::tools::{AddTaskParams, StatusParams, UpdateTaskParams};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Fallback that replays a fixed answer and records prompts.
    struct ScriptedLlm {
        answer: Result<String, fn() -> LlmError>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: fn() -> LlmError) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(err),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    /// Store that lists fine but rejects every update like a 404.
    struct ReadOnlyStore(InMemoryTaskStore);

    #[async_trait]
    impl TaskStore for ReadOnlyStore {
        async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
            self.0.list(filter).await
        }
        async fn get(&self, id: &str) -> Result<Task, StoreError> {
            self.0.get(id).await
        }
        async fn create(&self, task: &NewTask) -> Result<Task, StoreError> {
            self.0.create(task).await
        }
        async fn update(&self, _: &str, _: &TaskPatch) -> Result<Task, StoreError> {
            Err(StoreError::Api {
                status: 404,
                detail: "Task not found".to_string(),
            })
        }
        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.0.delete(id).await
        }
    }

    fn agent_with(store: InMemoryTaskStore) -> ChatAgent {
        ChatAgent::new(Arc::new(store), ScriptedLlm::answering("unused"))
    }

    #[tokio::test]
    async fn add_task_scenario() {
        let store = InMemoryTaskStore::new();
        let agent = agent_with(store.clone());

        let turn = agent.respond("Add a task to buy groceries").await;
        assert_eq!(turn.intent, Some(Intent::AddTask));
        assert_eq!(
            turn.tool_calls,
            vec![ToolCall::AddTask(AddTaskParams {
                title: "buy groceries".to_string(),
                description: None,
                priority: Priority::Medium,
                due_date: None,
            })]
        );
        assert!(turn
            .response
            .starts_with("I'll add \"buy groceries\" to your todo list."));
        assert!(turn
            .response
            .ends_with("\n\nSuccessfully added task: \"buy groceries\""));
        assert!(!turn.errored);
        assert_eq!(store.len().await, 1);
    }

    fn seeded(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            due_date: None,
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn renamed_title_keeps_typed_casing() {
        let store = InMemoryTaskStore::with_tasks(vec![
            seeded("t1", "Weekly report"),
            seeded("t2", "Report archive"),
        ]);
        let agent = agent_with(store.clone());

        let turn = agent
            .respond("Change the report title to Q3 Budget Review")
            .await;
        assert_eq!(turn.intent, Some(Intent::UpdateTask));
        assert_eq!(
            turn.tool_calls,
            vec![ToolCall::UpdateTask(UpdateTaskParams {
                id: "t1".to_string(),
                title: Some("Q3 Budget Review".to_string()),
                ..UpdateTaskParams::default()
            })]
        );
        assert_eq!(
            turn.response,
            "I'll update the title of \"report\" to \"Q3 Budget Review\".\n\nSuccessfully updated task: \"Q3 Budget Review\""
        );
        assert_eq!(store.get("t1").await.unwrap().title, "Q3 Budget Review");
        assert_eq!(store.get("t2").await.unwrap().title, "Report archive");
    }

    #[tokio::test]
    async fn pending_listing_scenario() {
        let agent = agent_with(InMemoryTaskStore::new());
        let turn = agent.respond("Show my pending tasks").await;
        assert_eq!(
            turn.tool_calls,
            vec![ToolCall::GetTasksByStatus(StatusParams {
                status: TaskStatus::Pending
            })]
        );
        assert_eq!(
            serde_json::to_value(&turn.tool_calls[0]).unwrap(),
            json!({"type": "get_tasks_by_status", "params": {"status": "pending"}})
        );
        assert_eq!(
            turn.response,
            "I'll fetch your pending tasks.\n\nRetrieved 0 pending tasks"
        );
    }

    #[tokio::test]
    async fn unknown_title_scenario() {
        let store = InMemoryTaskStore::new();
        store.create(&NewTask::new("Walk the dog")).await.unwrap();
        let agent = agent_with(store);

        let turn = agent.respond("Mark buy milk as complete").await;
        assert!(turn.tool_calls.is_empty());
        assert!(turn.tool_results.is_empty());
        assert_eq!(
            turn.response,
            "I couldn't find a task titled \"buy milk\". Could you please clarify?"
        );
        assert!(!turn.errored);
    }

    #[tokio::test]
    async fn resolved_title_is_completed() {
        let store = InMemoryTaskStore::new();
        let task = store.create(&NewTask::new("Buy milk and eggs")).await.unwrap();
        let agent = agent_with(store.clone());

        let turn = agent.respond("mark buy milk as done").await;
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(
            turn.response,
            "I'll mark \"buy milk\" as complete.\n\nSuccessfully updated task: \"Buy milk and eggs\""
        );
        assert!(store.get(&task.id).await.unwrap().is_completed());
    }

    #[tokio::test]
    async fn failed_tool_replaces_acknowledgement() {
        let inner = InMemoryTaskStore::new();
        inner.create(&NewTask::new("Quarterly report")).await.unwrap();
        let agent = ChatAgent::new(
            Arc::new(ReadOnlyStore(inner)),
            ScriptedLlm::answering("unused"),
        );

        let turn = agent.respond("set the report to high priority").await;
        assert_eq!(turn.intent, Some(Intent::SetTaskPriority));
        assert_eq!(turn.tool_results.len(), 1);
        assert!(turn.errored);
        assert_eq!(turn.response, "Failed to update task: Task not found");
    }

    #[tokio::test]
    async fn unmatched_message_goes_to_fallback_verbatim() {
        let llm = ScriptedLlm::answering("I can help you organise your day.");
        let agent = ChatAgent::new(Arc::new(InMemoryTaskStore::new()), llm.clone());

        let turn = agent.respond("How should I plan my week?").await;
        assert_eq!(turn.intent, None);
        assert_eq!(turn.response, "I can help you organise your day.");
        assert!(turn.tool_calls.is_empty());
        assert!(turn.tool_results.is_empty());

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("How should I plan my week?"));
    }

    #[tokio::test]
    async fn fallback_errors_become_apologies() {
        let agent = ChatAgent::new(
            Arc::new(InMemoryTaskStore::new()),
            ScriptedLlm::failing(|| LlmError::NotConfigured),
        );
        let turn = agent.respond("hello there").await;
        assert!(turn.errored);
        assert_eq!(
            turn.response,
            "Sorry, I encountered an error processing your request: generative fallback is not configured"
        );

        let agent = ChatAgent::new(
            Arc::new(InMemoryTaskStore::new()),
            ScriptedLlm::failing(|| LlmError::Empty),
        );
        let turn = agent.respond("hello there").await;
        assert!(!turn.errored);
        assert_eq!(
            turn.response,
            "I received your message: \"hello there\". How else can I help with your todos?"
        );
    }

    #[tokio::test]
    async fn raw_calls_drop_unregistered_names() {
        let store = InMemoryTaskStore::new();
        let agent = agent_with(store.clone());
        let calls = vec![
            RawToolCall {
                name: "add_task".to_string(),
                params: json!({"title": "Stretch"}),
            },
            RawToolCall {
                name: "summon_help".to_string(),
                params: json!({}),
            },
            RawToolCall {
                name: "get_tasks".to_string(),
                params: Value::Null,
            },
        ];
        let results = agent.execute_raw(&calls).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].message, "Successfully added task: \"Stretch\"");
        assert_eq!(results[1].message, "Retrieved 1 tasks");
    }
}

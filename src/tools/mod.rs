//! Tool registry: the closed set of task operations the chat layer can run.
//!
//! A [`ToolCall`] serializes as `{"type": <name>, "params": {...}}`. Every
//! dispatch yields exactly one [`ToolResult`]; store failures become
//! `success: false` results instead of errors.

mod tasks;

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::store::TaskStore;
use crate::task::{Priority, TaskPatch, TaskStatus};

#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid parameters for {tool}: {reason}")]
    InvalidParams { tool: String, reason: String },
}

/// Parameters for `add_task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTaskParams {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Parameters for `update_task`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskParams {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, alias = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl UpdateTaskParams {
    pub fn patch(&self) -> TaskPatch {
        TaskPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        }
    }
}

/// Parameters naming a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusParams {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityParams {
    pub id: String,
    pub priority: Priority,
}

/// One requested task operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum ToolCall {
    AddTask(AddTaskParams),
    UpdateTask(UpdateTaskParams),
    DeleteTask(TaskRef),
    GetTasks(NoParams),
    GetTasksByStatus(StatusParams),
    MarkTaskComplete(TaskRef),
    SetTaskPriority(PriorityParams),
}

impl ToolCall {
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::AddTask(_) => ToolKind::AddTask,
            Self::UpdateTask(_) => ToolKind::UpdateTask,
            Self::DeleteTask(_) => ToolKind::DeleteTask,
            Self::GetTasks(_) => ToolKind::GetTasks,
            Self::GetTasksByStatus(_) => ToolKind::GetTasksByStatus,
            Self::MarkTaskComplete(_) => ToolKind::MarkTaskComplete,
            Self::SetTaskPriority(_) => ToolKind::SetTaskPriority,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Parse an untyped `{type, params}` pair.
    ///
    /// Missing or `null` params are read as `{}`.
    pub fn from_parts(name: &str, params: Value) -> Result<Self, ToolError> {
        if ToolKind::from_name(name).is_none() {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        let params = if params.is_null() { json!({}) } else { params };
        serde_json::from_value(json!({ "type": name, "params": params })).map_err(|e| {
            ToolError::InvalidParams {
                tool: name.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// Registered tool names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    AddTask,
    UpdateTask,
    DeleteTask,
    GetTasks,
    GetTasksByStatus,
    MarkTaskComplete,
    SetTaskPriority,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        ToolKind::AddTask,
        ToolKind::UpdateTask,
        ToolKind::DeleteTask,
        ToolKind::GetTasks,
        ToolKind::GetTasksByStatus,
        ToolKind::MarkTaskComplete,
        ToolKind::SetTaskPriority,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTask => "add_task",
            Self::UpdateTask => "update_task",
            Self::DeleteTask => "delete_task",
            Self::GetTasks => "get_tasks",
            Self::GetTasksByStatus => "get_tasks_by_status",
            Self::MarkTaskComplete => "mark_task_complete",
            Self::SetTaskPriority => "set_task_priority",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AddTask => "Add a new task to the todo list.",
            Self::UpdateTask => "Change the title, description, status, priority or due date of a task.",
            Self::DeleteTask => "Delete a task from the todo list.",
            Self::GetTasks => "List every task.",
            Self::GetTasksByStatus => "List tasks with a given status (pending, in-progress, completed).",
            Self::MarkTaskComplete => "Mark a task as completed.",
            Self::SetTaskPriority => "Set the priority of a task (low, medium, high).",
        }
    }

    /// JSON schema of the `params` object.
    pub fn parameters_schema(&self) -> Value {
        let id = json!({"type": "string", "description": "Task identifier"});
        let status = json!({"type": "string", "enum": ["pending", "in-progress", "completed"]});
        let priority = json!({"type": "string", "enum": ["low", "medium", "high"]});
        let due_date = json!({"type": "string", "format": "date"});
        match self {
            Self::AddTask => json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "description": {"type": "string"},
                    "priority": priority,
                    "due_date": due_date
                },
                "required": ["title"]
            }),
            Self::UpdateTask => json!({
                "type": "object",
                "properties": {
                    "id": id,
                    "title": {"type": "string"},
                    "description": {"type": "string"},
                    "status": status,
                    "priority": priority,
                    "due_date": due_date
                },
                "required": ["id"]
            }),
            Self::DeleteTask | Self::MarkTaskComplete => json!({
                "type": "object",
                "properties": {"id": id},
                "required": ["id"]
            }),
            Self::GetTasks => json!({"type": "object", "properties": {}}),
            Self::GetTasksByStatus => json!({
                "type": "object",
                "properties": {"status": status},
                "required": ["status"]
            }),
            Self::SetTaskPriority => json!({
                "type": "object",
                "properties": {"id": id, "priority": priority},
                "required": ["id", "priority"]
            }),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Name, description and schema of a registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Executes tool calls against a task store.
#[derive(Clone)]
pub struct ToolRegistry {
    store: Arc<dyn TaskStore>,
}

impl ToolRegistry {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// List all registered tools.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        ToolKind::ALL
            .iter()
            .map(|k| ToolInfo {
                name: k.name().to_string(),
                description: k.description().to_string(),
                parameters: k.parameters_schema(),
            })
            .collect()
    }

    /// Run one call. Never fails: store errors come back as failed results.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        tracing::debug!(tool = call.name(), "Dispatching tool call");
        let store = self.store.as_ref();
        let result = match call {
            ToolCall::AddTask(p) => tasks::add_task(store, p).await,
            ToolCall::UpdateTask(p) => tasks::update_task(store, p).await,
            ToolCall::DeleteTask(p) => tasks::delete_task(store, p).await,
            ToolCall::GetTasks(_) => tasks::get_tasks(store).await,
            ToolCall::GetTasksByStatus(p) => tasks::get_tasks_by_status(store, p).await,
            ToolCall::MarkTaskComplete(p) => tasks::mark_task_complete(store, p).await,
            ToolCall::SetTaskPriority(p) => tasks::set_task_priority(store, p).await,
        };
        if result.success {
            tracing::info!(tool = call.name(), message = %result.message, "Tool succeeded");
        } else {
            tracing::warn!(tool = call.name(), message = %result.message, "Tool failed");
        }
        result
    }

    /// Run an untyped `{type, params}` call.
    pub async fn dispatch_raw(&self, name: &str, params: Value) -> Result<ToolResult, ToolError> {
        let call = ToolCall::from_parts(name, params)?;
        Ok(self.dispatch(&call).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTaskStore;

    #[test]
    fn add_task_call_wire_shape() {
        let call = ToolCall::AddTask(AddTaskParams {
            title: "buy groceries".to_string(),
            description: None,
            priority: Priority::Medium,
            due_date: None,
        });
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({"type": "add_task", "params": {"title": "buy groceries", "priority": "medium"}})
        );
    }

    #[test]
    fn status_call_wire_shape() {
        let call = ToolCall::GetTasksByStatus(StatusParams {
            status: TaskStatus::Pending,
        });
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({"type": "get_tasks_by_status", "params": {"status": "pending"}})
        );
    }

    #[test]
    fn from_parts_accepts_missing_params() {
        assert_eq!(
            ToolCall::from_parts("get_tasks", Value::Null),
            Ok(ToolCall::GetTasks(NoParams {}))
        );
    }

    #[test]
    fn from_parts_rejects_unknown_and_invalid() {
        assert_eq!(
            ToolCall::from_parts("launch_rocket", json!({})),
            Err(ToolError::UnknownTool("launch_rocket".to_string()))
        );
        assert!(matches!(
            ToolCall::from_parts("set_task_priority", json!({"id": "1", "priority": "urgent!"})),
            Err(ToolError::InvalidParams { tool, .. }) if tool == "set_task_priority"
        ));
    }

    #[test]
    fn every_kind_round_trips_by_name() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.parameters_schema()["type"], "object");
        }
    }

    #[tokio::test]
    async fn unknown_tool_yields_no_result() {
        let registry = ToolRegistry::new(Arc::new(InMemoryTaskStore::new()));
        let outcome = registry.dispatch_raw("archive_task", json!({"id": "1"})).await;
        assert_eq!(outcome, Err(ToolError::UnknownTool("archive_task".to_string())));
        assert_eq!(registry.list_tools().len(), 7);
    }
}

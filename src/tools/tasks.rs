//! Task tools. Each shapes one store outcome into one `ToolResult`.

use serde::Serialize;
use serde_json::Value;

use super::{AddTaskParams, PriorityParams, StatusParams, TaskRef, ToolResult, UpdateTaskParams};
use crate::store::TaskStore;
use crate::task::{NewTask, TaskFilter, TaskStatus};

fn to_data<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

pub(super) async fn add_task(store: &dyn TaskStore, params: &AddTaskParams) -> ToolResult {
    let new = NewTask::new(params.title.clone())
        .with_description(params.description.clone().unwrap_or_default())
        .with_priority(params.priority)
        .with_due_date(params.due_date);

    match store.create(&new).await {
        Ok(task) => ToolResult::ok(
            format!("Successfully added task: \"{}\"", task.title),
            to_data(&task),
        ),
        Err(e) => ToolResult::failed(format!("Failed to add task: {}", e)),
    }
}

pub(super) async fn update_task(store: &dyn TaskStore, params: &UpdateTaskParams) -> ToolResult {
    match store.update(&params.id, &params.patch()).await {
        Ok(task) => ToolResult::ok(
            format!("Successfully updated task: \"{}\"", task.title),
            to_data(&task),
        ),
        Err(e) => ToolResult::failed(format!("Failed to update task: {}", e)),
    }
}

pub(super) async fn delete_task(store: &dyn TaskStore, params: &TaskRef) -> ToolResult {
    match store.delete(&params.id).await {
        Ok(()) => ToolResult::ok("Successfully deleted task", None),
        Err(e) => ToolResult::failed(format!("Failed to delete task: {}", e)),
    }
}

pub(super) async fn get_tasks(store: &dyn TaskStore) -> ToolResult {
    match store.list(&TaskFilter::default()).await {
        Ok(tasks) => ToolResult::ok(format!("Retrieved {} tasks", tasks.len()), to_data(&tasks)),
        Err(e) => ToolResult::failed(format!("Failed to fetch tasks: {}", e)),
    }
}

pub(super) async fn get_tasks_by_status(store: &dyn TaskStore, params: &StatusParams) -> ToolResult {
    match store.list(&TaskFilter::by_status(params.status)).await {
        Ok(tasks) => ToolResult::ok(
            format!("Retrieved {} {} tasks", tasks.len(), params.status),
            to_data(&tasks),
        ),
        Err(e) => ToolResult::failed(format!("Failed to fetch tasks: {}", e)),
    }
}

pub(super) async fn mark_task_complete(store: &dyn TaskStore, params: &TaskRef) -> ToolResult {
    update_task(
        store,
        &UpdateTaskParams {
            id: params.id.clone(),
            status: Some(TaskStatus::Completed),
            ..UpdateTaskParams::default()
        },
    )
    .await
}

pub(super) async fn set_task_priority(store: &dyn TaskStore, params: &PriorityParams) -> ToolResult {
    update_task(
        store,
        &UpdateTaskParams {
            id: params.id.clone(),
            priority: Some(params.priority),
            ..UpdateTaskParams::default()
        },
    )
    .await
}

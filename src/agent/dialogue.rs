//! Turn planning: from an extracted intent and the current task list to an
//! acknowledgement and the tool calls that carry it out.
//!
//! Planning is pure. The caller fetches the task list beforehand and executes
//! the returned calls afterwards, so the acknowledgement describes the
//! pending action rather than its outcome.

use crate::intent::{Entities, Intent, UpdateField};
use crate::task::{Priority, Task, TaskStatus};
use crate::tools::{
    AddTaskParams, NoParams, PriorityParams, StatusParams, TaskRef, ToolCall, UpdateTaskParams,
};

/// Title used when an add request carries no usable title.
pub const UNTITLED_TASK: &str = "Untitled task";

/// Acknowledgement text plus the calls to run, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
}

impl Plan {
    fn reply(response: String) -> Self {
        Self {
            response,
            tool_calls: Vec::new(),
        }
    }

    fn single(response: String, call: ToolCall) -> Self {
        Self {
            response,
            tool_calls: vec![call],
        }
    }
}

/// First task whose title contains `title` or is contained in it, ignoring case.
///
/// An empty `title` never matches.
pub fn find_task_by_title<'a>(tasks: &'a [Task], title: &str) -> Option<&'a Task> {
    let needle = title.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    tasks.iter().find(|t| {
        let hay = t.title.trim().to_lowercase();
        !hay.is_empty() && (hay.contains(&needle) || needle.contains(&hay))
    })
}

fn not_found(title: &str) -> Plan {
    Plan::reply(format!(
        "I couldn't find a task titled \"{}\". Could you please clarify?",
        title
    ))
}

/// Plan one turn. `tasks` is only consulted for intents that name a task.
pub fn plan(intent: Intent, entities: &Entities, tasks: &[Task]) -> Plan {
    let title = entities.title.as_deref().unwrap_or("").trim();

    match intent {
        Intent::AddTask => {
            let title = if title.is_empty() { UNTITLED_TASK } else { title };
            Plan::single(
                format!("I'll add \"{}\" to your todo list.", title),
                ToolCall::AddTask(AddTaskParams {
                    title: title.to_string(),
                    description: None,
                    priority: entities.priority.unwrap_or(Priority::Medium),
                    due_date: None,
                }),
            )
        }
        Intent::GetTasks => Plan::single(
            "I'll fetch all your tasks.".to_string(),
            ToolCall::GetTasks(NoParams {}),
        ),
        Intent::GetPendingTasks => status_listing(TaskStatus::Pending),
        Intent::GetCompletedTasks => status_listing(TaskStatus::Completed),
        Intent::GetInProgressTasks => status_listing(TaskStatus::InProgress),
        Intent::MarkTaskComplete => match find_task_by_title(tasks, title) {
            Some(task) => Plan::single(
                format!("I'll mark \"{}\" as complete.", title),
                ToolCall::MarkTaskComplete(TaskRef {
                    id: task.id.clone(),
                }),
            ),
            None => not_found(title),
        },
        Intent::SetTaskPriority => {
            let Some(priority) = entities.priority else {
                return Plan::reply(format!(
                    "Which priority should \"{}\" have: low, medium or high?",
                    title
                ));
            };
            match find_task_by_title(tasks, title) {
                Some(task) => Plan::single(
                    format!("I'll set the priority of \"{}\" to {}.", title, priority),
                    ToolCall::SetTaskPriority(PriorityParams {
                        id: task.id.clone(),
                        priority,
                    }),
                ),
                None => not_found(title),
            }
        }
        Intent::UpdateTask => match find_task_by_title(tasks, title) {
            Some(task) => match field_change(entities) {
                Some(change) => Plan::single(
                    format!(
                        "I'll update the {} of \"{}\" to {}.",
                        change.field, title, change.shown
                    ),
                    ToolCall::UpdateTask(UpdateTaskParams {
                        id: task.id.clone(),
                        ..change.params
                    }),
                ),
                None => Plan::reply(format!(
                    "What would you like to update about \"{}\"?",
                    title
                )),
            },
            None => not_found(title),
        },
        Intent::DeleteTask => match find_task_by_title(tasks, title) {
            Some(task) => Plan::single(
                format!("I'll delete \"{}\" from your todo list.", title),
                ToolCall::DeleteTask(TaskRef {
                    id: task.id.clone(),
                }),
            ),
            None => not_found(title),
        },
    }
}

fn status_listing(status: TaskStatus) -> Plan {
    Plan::single(
        format!("I'll fetch your {} tasks.", status),
        ToolCall::GetTasksByStatus(StatusParams { status }),
    )
}

/// A concrete field change requested in an update message.
struct FieldChange {
    field: UpdateField,
    /// Params without the task id
    params: UpdateTaskParams,
    /// Value as echoed back to the user
    shown: String,
}

fn field_change(entities: &Entities) -> Option<FieldChange> {
    let field = entities.field?;
    let value = entities.value.as_deref()?.trim();
    if value.is_empty() {
        return None;
    }
    let mut params = UpdateTaskParams::default();
    let shown = match field {
        UpdateField::Title => {
            params.title = Some(value.to_string());
            format!("\"{}\"", value)
        }
        UpdateField::Description => {
            params.description = Some(value.to_string());
            format!("\"{}\"", value)
        }
        UpdateField::Status => {
            let status = value.parse::<TaskStatus>().ok()?;
            params.status = Some(status);
            status.to_string()
        }
        UpdateField::Priority => {
            let priority = value.parse::<Priority>().ok()?;
            params.priority = Some(priority);
            priority.to_string()
        }
    };
    Some(FieldChange {
        field,
        params,
        shown,
    })
}

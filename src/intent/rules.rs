//! Built-in intent rules, in evaluation order.

use regex::Captures;

use super::{first_group, verbatim_group, Entities, Intent, IntentRule, UpdateField};
use crate::task::{Priority, TaskStatus};

const LIST_VERBS: &str = r"(show|list|display|see)\s+";

/// The todo rule table. Order matters: earlier rules shadow later ones.
pub fn default_rules() -> Vec<IntentRule> {
    let table: [(Intent, String, fn(&Captures<'_>, &str) -> Entities); 9] = [
        (
            Intent::AddTask,
            r"(add|create|make|new)\s+(a\s+)?task\s+to\s+(.+)|add\s+(.+)\s+to\s+my\s+todo".to_string(),
            |c, _| Entities::title(&first_group(c, &[3, 4])),
        ),
        (
            Intent::GetTasks,
            format!(r"{LIST_VERBS}(all\s+)?(my\s+)?(tasks|todos)"),
            |_, _| Entities::default(),
        ),
        (
            Intent::GetPendingTasks,
            format!(r"{LIST_VERBS}(my\s+)?(pending|incomplete|open)\s+(tasks|todos)"),
            |_, _| Entities::status(TaskStatus::Pending),
        ),
        (
            Intent::GetCompletedTasks,
            format!(r"{LIST_VERBS}(my\s+)?(completed|done|finished)\s+(tasks|todos)"),
            |_, _| Entities::status(TaskStatus::Completed),
        ),
        (
            Intent::GetInProgressTasks,
            format!(r"{LIST_VERBS}(my\s+)?(in-progress|working-on|active)\s+(tasks|todos)"),
            |_, _| Entities::status(TaskStatus::InProgress),
        ),
        (
            Intent::MarkTaskComplete,
            r"(mark|set|complete|finish|done)\s+(the\s+)?(.+?)\s+(as\s+)?(complete|done|finished)".to_string(),
            |c, _| Entities::title(&first_group(c, &[3])),
        ),
        (
            Intent::SetTaskPriority,
            r"(set|change|update)\s+(the\s+)?(.+?)\s+(to\s+)?(high|medium|low)\s+priority".to_string(),
            |c, _| Entities {
                priority: c.get(5).and_then(|m| m.as_str().parse::<Priority>().ok()),
                ..Entities::title(&first_group(c, &[3]))
            },
        ),
        (
            Intent::UpdateTask,
            r"(update|change|modify|edit)\s+(the\s+)?(.+?)\s+(title|description|status|priority)(?:\s+to\s+(.+))?".to_string(),
            |c, original| Entities {
                field: c.get(4).and_then(|m| UpdateField::parse(m.as_str())),
                value: verbatim_group(c, 5, original).filter(|v| !v.is_empty()),
                ..Entities::title(&first_group(c, &[3]))
            },
        ),
        (
            Intent::DeleteTask,
            r"(delete|remove|cancel)\s+(the\s+)?(.+?)\s+(task|from|from\s+my\s+todo)".to_string(),
            |c, _| Entities::title(&first_group(c, &[3])),
        ),
    ];

    table
        .into_iter()
        .map(|(intent, pattern, extract)| {
            IntentRule::new(intent, &pattern, extract)
                .unwrap_or_else(|e| panic!("built-in pattern for {} is invalid: {}", intent, e))
        })
        .collect()
}

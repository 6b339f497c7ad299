//! Intent extraction: ordered regex rules over the lower-cased message.
//!
//! Rules are tried in list order and the first match wins. There is no
//! scoring; a message that fits several rules gets the earliest one.

mod rules;

use std::fmt;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::task::{Priority, TaskStatus};

pub use rules::default_rules;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AddTask,
    GetTasks,
    GetPendingTasks,
    GetCompletedTasks,
    GetInProgressTasks,
    MarkTaskComplete,
    SetTaskPriority,
    UpdateTask,
    DeleteTask,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddTask => "add_task",
            Self::GetTasks => "get_tasks",
            Self::GetPendingTasks => "get_pending_tasks",
            Self::GetCompletedTasks => "get_completed_tasks",
            Self::GetInProgressTasks => "get_in_progress_tasks",
            Self::MarkTaskComplete => "mark_task_complete",
            Self::SetTaskPriority => "set_task_priority",
            Self::UpdateTask => "update_task",
            Self::DeleteTask => "delete_task",
        }
    }

    /// Intents that name an existing task and need a title lookup.
    pub fn references_task(&self) -> bool {
        matches!(
            self,
            Self::MarkTaskComplete | Self::SetTaskPriority | Self::UpdateTask | Self::DeleteTask
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task field named in an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateField {
    Title,
    Description,
    Status,
    Priority,
}

impl UpdateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Status => "status",
            Self::Priority => "priority",
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word {
            "title" => Some(Self::Title),
            "description" => Some(Self::Description),
            "status" => Some(Self::Status),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

impl fmt::Display for UpdateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values pulled out of the message by a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<UpdateField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Entities {
    pub fn title(title: &str) -> Self {
        Self {
            title: Some(title.trim().to_string()),
            ..Self::default()
        }
    }

    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Result of running the extractor on one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub intent: Option<Intent>,
    pub entities: Entities,
}

/// Builds entities from the captures of a matching rule. Captures index the
/// lower-cased message; the second argument is the message as typed.
pub type EntityExtractor = fn(&Captures<'_>, &str) -> Entities;

/// One pattern and its entity extractor.
pub struct IntentRule {
    pub intent: Intent,
    pattern: Regex,
    extract: EntityExtractor,
}

impl IntentRule {
    pub fn new(intent: Intent, pattern: &str, extract: EntityExtractor) -> Result<Self, regex::Error> {
        Ok(Self {
            intent,
            pattern: Regex::new(pattern)?,
            extract,
        })
    }

    /// Entities for `text` if the pattern matches anywhere in its
    /// lower-cased form.
    pub fn apply(&self, text: &str) -> Option<Entities> {
        self.apply_lowered(text, &text.to_lowercase())
    }

    fn apply_lowered(&self, original: &str, lower: &str) -> Option<Entities> {
        self.pattern
            .captures(lower)
            .map(|caps| (self.extract)(&caps, original))
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentRule")
            .field("intent", &self.intent)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// First-match dispatcher over an ordered rule list.
#[derive(Debug)]
pub struct IntentExtractor {
    rules: Vec<IntentRule>,
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentExtractor {
    /// Extractor with the built-in todo rules.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify `text`. Never fails; no match yields `intent: None`.
    pub fn extract(&self, text: &str) -> Extraction {
        let lower = text.to_lowercase();
        for rule in &self.rules {
            if let Some(entities) = rule.apply_lowered(text, &lower) {
                tracing::debug!(intent = %rule.intent, ?entities, "Intent rule matched");
                return Extraction {
                    intent: Some(rule.intent),
                    entities,
                };
            }
        }
        tracing::debug!("No intent rule matched");
        Extraction::default()
    }
}

/// Text of the first participating group among `groups`, trimmed.
fn first_group(caps: &Captures<'_>, groups: &[usize]) -> String {
    groups
        .iter()
        .find_map(|&i| caps.get(i))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Group `i` as the user typed it, trimmed.
///
/// Falls back to the lower-cased capture when lowering moved byte offsets.
fn verbatim_group(caps: &Captures<'_>, i: usize, original: &str) -> Option<String> {
    let m = caps.get(i)?;
    let verbatim = original
        .get(m.range())
        .filter(|s| s.to_lowercase() == m.as_str())
        .unwrap_or(m.as_str());
    Some(verbatim.trim().to_string())
}

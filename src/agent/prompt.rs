//! Prompt template for the generative fallback.

use crate::tools::ToolRegistry;

/// Build the single-turn fallback prompt for a message no rule understood.
pub fn build_fallback_prompt(message: &str, tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful assistant for managing a todo list.

The user sent this message: "{message}"

## Supported Actions
{tool_descriptions}

## Rules
1. If the message asks for one of the supported actions, say which one and which task it concerns, and suggest a phrasing such as "add a task to ...", "show my pending tasks", "mark ... as done", "set ... to high priority" or "delete the ... task".
2. If the message is not about the todo list, answer briefly and steer back to the todo list.
3. Keep the reply short and plain; do not invent tasks that were not mentioned."#,
        message = message.replace('"', "'"),
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTaskStore;
    use std::sync::Arc;

    #[test]
    fn prompt_lists_every_tool_and_quotes_message() {
        let tools = ToolRegistry::new(Arc::new(InMemoryTaskStore::new()));
        let prompt = build_fallback_prompt("what is \"due\" today?", &tools);
        assert!(prompt.contains("The user sent this message: \"what is 'due' today?\""));
        for tool in tools.list_tools() {
            assert!(prompt.contains(&format!("**{}**", tool.name)));
        }
    }
}

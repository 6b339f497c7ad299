//! Chat agent: turns one user message into tool calls and a reply.

mod compose;
mod dialogue;
mod prompt;
mod turn;

pub use compose::{compose, Composition};
pub use dialogue::{find_task_by_title, plan, Plan, UNTITLED_TASK};
pub use prompt::build_fallback_prompt;
pub use turn::{ChatAgent, RawToolCall, Turn};

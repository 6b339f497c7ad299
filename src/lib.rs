//! # Todo Chat
//!
//! A chat layer for a todo list. Messages are matched against an ordered
//! table of intent rules; matched intents become tool calls against a remote
//! task API, and anything no rule understands goes to a generative fallback.
//!
//! ## Architecture
//!
//! One message is one turn:
//! 1. Extract an intent and its entities from the text
//! 2. Fetch the task list if the intent names a task, and resolve the title
//! 3. Run the planned tool calls in order against the task store
//! 4. Compose the acknowledgement and tool results into the reply
//!
//! ## Example
//!
//! ```rust,ignore
//! use todo_chat::{agent::ChatAgent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = ChatAgent::from_config(&config)?;
//! let turn = agent.respond("Show my pending tasks").await;
//! println!("{}", turn.response);
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod conversation;
pub mod intent;
pub mod llm;
pub mod store;
pub mod task;
pub mod tools;

pub use config::Config;

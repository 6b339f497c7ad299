//! HTTP API for the chat entry point.

mod chat;
mod routes;
pub mod types;

pub use routes::{router, serve, AppState};

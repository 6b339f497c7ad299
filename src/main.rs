//! Todo Chat - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the chat API.

use todo_chat::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: task_api={}, model={}",
        config.task_api.base_url, config.fallback.model
    );

    api::serve(config).await?;

    Ok(())
}

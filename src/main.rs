//! Quizgate console bot
//!
//! Reads inbound events as JSON lines on stdin and writes the resulting
//! actions as JSON lines on stdout. Logs go to stderr.

use quizgate::config::AppConfig;
use quizgate::console::{self, ConsoleMessenger};
use quizgate::runtime::Dispatcher;
use quizgate::store::{MemorySessionStore, SessionStore, SqliteSessionStore};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizgate=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn SessionStore> = match &config.db_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %path.display(), "Opening session database");
            Arc::new(SqliteSessionStore::open(path)?)
        }
        None => {
            tracing::info!("Keeping sessions in memory");
            Arc::new(MemorySessionStore::new())
        }
    };

    tracing::info!(
        questions = config.script.question_count(),
        gates = config.script.gates.len(),
        payload = ?config.script.payload,
        "Script loaded"
    );

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(config.script),
        store,
        ConsoleMessenger::stdout(),
    ));
    let janitor = dispatcher.spawn_janitor(config.sweep_every, config.idle_ttl);

    let handled = console::run(&dispatcher, BufReader::new(tokio::io::stdin())).await?;
    tracing::info!(events = handled, "Input closed, shutting down");

    janitor.abort();
    Ok(())
}

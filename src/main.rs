//! AgriQuery interactive console
//!
//! Wires the full engine against a local readings database for manual
//! testing. Production deployments embed the library behind their own
//! API layer instead of running this binary.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use agriquery::config::{ConfigStore, ConfigStoreConfig};
use agriquery::db::{create_database_pool, ensure_schema, DatabaseConfig};
use agriquery::llm::{ChatClientConfig, ChatCompletionClient};
use agriquery::logging::{init_logging, LoggingConfig};
use agriquery::memory::ConversationMemory;
use agriquery::ontology::Ontology;
use agriquery::service::QueryService;
use agriquery::store::SqliteReadingStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logging = init_logging(LoggingConfig::development())?;

    let settings = ConfigStore::new(ConfigStoreConfig::default()).await?;
    let config = settings.get().await;

    let db_config = match std::env::args().nth(1) {
        Some(path) => DatabaseConfig::with_path(PathBuf::from(path)),
        None => DatabaseConfig::default(),
    };
    let pool = create_database_pool(&db_config).await?;
    ensure_schema(&pool).await?;

    // The API key never lives in the settings file; without one the
    // engine runs in degraded mode on its built-in dictionaries.
    let api_key = std::env::var("AGRIQUERY_API_KEY").unwrap_or_default();
    let mut completion_settings = config.completion.clone();
    if api_key.is_empty() {
        completion_settings.enabled = false;
    }
    let client = ChatCompletionClient::new(ChatClientConfig::from_settings(
        &completion_settings,
        SecretString::new(api_key),
    ))?;

    let ontology = Arc::new(Ontology::from_builtin(config.ontology.clone())?);
    let memory = Arc::new(ConversationMemory::new(&config.memory));
    let store = SqliteReadingStore::new(pool, config.store.clone());
    let service = QueryService::new(
        config,
        ontology,
        memory,
        Arc::new(client),
        Arc::new(store),
    );

    println!("AgriQuery console. Ask about your sensors in English or Persian; empty line exits.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        let result = service.process_query(question, "console", "dashboard").await;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

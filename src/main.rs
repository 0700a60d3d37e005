use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{error, info, warn};

mod config;
mod db;
mod llm;
mod query;
mod util;
mod web;

use crate::config::{AppConfig, CliArgs};
use crate::db::executor::{DuckDbExecutor, QueryExecutor};
use crate::db::schema::SchemaDescriptor;
use crate::db::Database;
use crate::llm::{LlmManager, TextGenerator};
use crate::query::QueryPipeline;
use crate::util::logging::init_tracing;
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    init_tracing(&config.logging, std::io::stdout().is_terminal());
    if config.debug {
        warn!("Debug mode is on: internal error details are returned to clients");
    }

    info!("Initializing DuckDB connection pool");
    let db = Database::open(&config.database)?;
    let executor: Arc<dyn QueryExecutor> = Arc::new(DuckDbExecutor::new(db.clone()));

    // The service still starts without a model; queries then report a configuration error
    info!("Initializing LLM manager with backend: {}", config.llm.backend);
    let generator: Option<Arc<dyn TextGenerator>> = match LlmManager::new(&config.llm) {
        Ok(manager) => Some(Arc::new(manager)),
        Err(e) => {
            error!("Failed to initialize LLM client: {}", e);
            None
        }
    };

    let pipeline = QueryPipeline::new(generator, Some(executor), SchemaDescriptor::ecommerce());
    let app_state = Arc::new(AppState::new(config.clone(), db, pipeline));

    // Start the web server
    info!("Starting NL-Shop server on {}:{}", config.web.host, config.web.port);
    match web::run_server(&config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

pub mod db_pool;
pub mod executor;
pub mod models;
pub mod orders;
pub mod products;
pub mod rows;
pub mod schema;
pub mod users;

use crate::config::DatabaseConfig;
use db_pool::DuckDBConnectionManager;
use duckdb::Connection;
use r2d2::Pool;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database error: {0}")]
    DuckDb(#[from] duckdb::Error),
    #[error("query rejected: {0}")]
    Rejected(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Pooled handle to the DuckDB database shared by every service.
#[derive(Clone)]
pub struct Database {
    pool: Pool<DuckDBConnectionManager>,
}

impl Database {
    /// Opens the database and creates the e-commerce schema if needed.
    pub fn open(config: &DatabaseConfig) -> Result<Self, DbError> {
        info!("Opening DuckDB database at {}", config.connection_string);
        let manager = DuckDBConnectionManager::new(&config.connection_string)?;
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1) as u32)
            .build(manager)?;

        let conn = pool.get()?;
        schema::bootstrap(&conn)?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::open(&DatabaseConfig {
            connection_string: ":memory:".to_string(),
            pool_size: 2,
        })
        .expect("in-memory database")
    }

    /// Runs `f` on a pooled connection off the async runtime.
    pub async fn run<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await?
    }
}

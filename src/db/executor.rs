use crate::db::rows::{collect_rows, RowSet};
use crate::db::{Database, DbError};
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Storage-side capability the query pipeline depends on.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs a read-only statement and returns its rows in result order.
    async fn execute(&self, sql: &str) -> Result<RowSet, DbError>;

    /// Whether the database answers a trivial query.
    async fn health_check(&self) -> bool;
}

/// Statements the executor refuses regardless of any upstream check.
const FORBIDDEN_KEYWORDS: [&str; 7] = [
    "drop", "delete", "update", "insert", "create", "alter", "truncate",
];

/// Refuses anything that is not a single SELECT/WITH query.
pub fn guard_read_only(sql: &str) -> Result<(), DbError> {
    let normalized = sql.trim().to_lowercase();

    if !(normalized.starts_with("select") || normalized.starts_with("with")) {
        return Err(DbError::Rejected(
            "only SELECT and WITH queries are allowed".to_string(),
        ));
    }

    if let Some(keyword) = FORBIDDEN_KEYWORDS.iter().find(|kw| normalized.contains(*kw)) {
        return Err(DbError::Rejected(format!(
            "operation not allowed: {}",
            keyword
        )));
    }

    Ok(())
}

/// Executes vetted queries against the shared DuckDB database.
pub struct DuckDbExecutor {
    db: Database,
}

impl DuckDbExecutor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QueryExecutor for DuckDbExecutor {
    async fn execute(&self, sql: &str) -> Result<RowSet, DbError> {
        guard_read_only(sql)?;

        let statement = sql.trim().trim_end_matches(';').trim_end().to_string();
        info!("Executing SQL query: {}", statement);

        // Wrapping forces the text to parse as one query
        let wrapped = format!("SELECT * FROM ({}) AS subquery", statement);

        let result = self
            .db
            .run(move |conn| {
                let mut stmt = conn.prepare(&wrapped)?;
                let mut rows = stmt.query([])?;
                Ok(collect_rows(&mut rows)?)
            })
            .await;

        match &result {
            Ok(rows) => info!("Query executed successfully. Rows returned: {}", rows.len()),
            Err(e) => {
                error!("Error executing SQL query: {}", e);
                error!("Query that failed: {}", statement);
            }
        }

        result
    }

    async fn health_check(&self) -> bool {
        let result = self
            .db
            .run(|conn| {
                conn.query_row("SELECT count(*) FROM (SELECT id FROM users LIMIT 1)", [], |row| {
                    row.get::<_, i64>(0)
                })?;
                Ok(())
            })
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Database health check failed: {}", e);
                false
            }
        }
    }
}

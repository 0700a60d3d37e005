use crate::db::DbError;
use crate::llm::LlmError;

/// Every way a natural-language query can fail once it reaches the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// One or more collaborators were never configured.
    #[error("Services not configured: {}", .0.join(", "))]
    Configuration(Vec<String>),
    #[error("Text generation failed: {0}")]
    Generation(#[from] LlmError),
    #[error("Could not translate model output into SQL: {0}")]
    Translation(String),
    #[error("SQL query not allowed for security reasons: {0}")]
    SecurityRejection(String),
    #[error("Query execution failed: {0}")]
    Execution(#[from] DbError),
}

impl QueryError {
    /// Caller mistakes as opposed to server faults.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::SecurityRejection(_))
    }
}

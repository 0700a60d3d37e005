use crate::db::DbError;
use crate::query::QueryError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Shown instead of internal error text unless debug mode is on.
const HIDDEN_DETAILS: &str = "Contact administrator";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    details: Option<String>,
    timestamp: String,
}

/// Error returned by every handler, rendered as `{error, details, timestamp}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, None)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, None)
    }

    fn internal(error: impl Into<String>, cause: &dyn std::fmt::Display, debug: bool) -> Self {
        error!("Internal error: {}", cause);
        let details = if debug {
            cause.to_string()
        } else {
            HIDDEN_DETAILS.to_string()
        };
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error, Some(details))
    }

    pub fn query(err: QueryError, debug: bool) -> Self {
        match &err {
            QueryError::SecurityRejection(reason) => Self::new(
                StatusCode::BAD_REQUEST,
                "SQL query not allowed for security reasons",
                Some(reason.clone()),
            ),
            QueryError::Configuration(_) => {
                Self::internal("Service not configured correctly", &err, debug)
            }
            QueryError::Generation(_) => {
                Self::internal("Error generating response with the language model", &err, debug)
            }
            QueryError::Translation(_) => {
                Self::internal("Error translating query to SQL", &err, debug)
            }
            QueryError::Execution(_) => Self::internal("Error executing query", &err, debug),
        }
    }

    pub fn db(err: DbError, debug: bool) -> Self {
        match err {
            DbError::NotFound(what) => Self::not_found(format!("{} not found", capitalize(&what))),
            DbError::Conflict(message) | DbError::Invalid(message) | DbError::Rejected(message) => {
                Self::bad_request(message)
            }
            other => Self::internal("Internal server error", &other, debug),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Invalid request body",
            Some(rejection.body_text()),
        )
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    #[test]
    fn test_security_rejection_is_client_error() {
        let err = ApiError::query(QueryError::SecurityRejection("Dangerous operation detected: drop".into()), false);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.details.as_deref(), Some("Dangerous operation detected: drop"));
    }

    #[test]
    fn test_server_fault_details_hidden_unless_debug() {
        let hidden = ApiError::query(QueryError::Generation(LlmError::EmptyResponse), false);
        assert_eq!(hidden.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hidden.details.as_deref(), Some(HIDDEN_DETAILS));

        let shown = ApiError::query(QueryError::Translation("no json".into()), true);
        assert_eq!(
            shown.details.as_deref(),
            Some("Could not translate model output into SQL: no json")
        );
    }

    #[test]
    fn test_db_error_mapping() {
        assert_eq!(
            ApiError::db(DbError::NotFound("user u1".into()), false).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::db(DbError::Conflict("dup".into()), false).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::db(DbError::Invalid("bad".into()), false).status(),
            StatusCode::BAD_REQUEST
        );
    }
}

use crate::query::models::SafetyVerdict;
use tracing::warn;

/// Decides whether model-generated SQL may reach the executor.
pub trait SafetyGate: Send + Sync {
    fn check(&self, sql: &str) -> SafetyVerdict;
}

/// Substrings that make a statement unsafe wherever they appear.
pub const DENYLIST: [&str; 11] = [
    "drop", "delete", "insert", "update", "alter", "create", "truncate", "grant", "revoke",
    "exec", "execute",
];

/// Substring denylist plus a leading `select` requirement.
///
/// This is not a parser. Identifiers that merely contain a keyword (`created_at`,
/// a table named `updates`) are rejected too, and obfuscated statements may slip
/// through; the executor repeats its own read-only check.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenylistGate;

impl SafetyGate for DenylistGate {
    fn check(&self, sql: &str) -> SafetyVerdict {
        let normalized = sql.trim().to_lowercase();

        if let Some(keyword) = DENYLIST.iter().find(|kw| normalized.contains(*kw)) {
            warn!("Dangerous query detected: {}", keyword);
            return SafetyVerdict::Unsafe {
                reason: format!("Dangerous operation detected: {}", keyword),
            };
        }

        if !normalized.starts_with("select") {
            warn!("Query is not a SELECT");
            return SafetyVerdict::Unsafe {
                reason: "Only SELECT queries are allowed".to_string(),
            };
        }

        SafetyVerdict::Safe
    }
}

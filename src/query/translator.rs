use crate::llm::{non_empty, TextGenerator};
use crate::query::error::QueryError;
use crate::query::models::SqlCandidate;
use serde_json::Value;
use tracing::{debug, info};

/// Used when the model omits or garbles `confidence`.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Asks the model for SQL answering a question and validates the reply envelope.
pub struct QueryTranslator<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> QueryTranslator<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }

    pub async fn translate(&self, question: &str, schema: &str) -> Result<SqlCandidate, QueryError> {
        info!("Processing query with {}: {}", self.generator.name(), question);

        let prompt = build_prompt(question, schema);
        let raw = non_empty(self.generator.generate(&prompt).await?)?;
        debug!("Model response received: {} characters", raw.len());

        let candidate = parse_candidate(&raw, question)?;
        info!(
            "SQL generated successfully: {} (confidence {:.2})",
            candidate.sql_query, candidate.confidence
        );
        Ok(candidate)
    }
}

fn build_prompt(question: &str, schema: &str) -> String {
    format!(
        r#"
You are an expert in DuckDB SQL for an e-commerce system. Your task is to understand customer queries given in natural language and transform them into SQL that can answer them.

IMPORTANT RULES:
- Return ONLY a valid JSON object
- Do not include additional text before or after the JSON
- Do NOT include semicolons at the end of SQL statements
- Return a single SELECT statement
- Use ONLY the tables and columns listed below
- Use proper table aliases when joining tables
- For product recommendations, focus on the products table with relevant filters
- For user queries, use the users table
- For order queries, join orders with order_items and products
- Product categories: Accessories, Smartphones, Laptops, Audio

DATABASE SCHEMA:
{schema}

REQUIRED RESPONSE FORMAT:
{{
    "sql_query": "SELECT u.name, u.email FROM users u WHERE u.role = 'admin'",
    "original_query": "user's original query",
    "confidence": 0.95
}}

USER QUERY: {question}
"#
    )
}

/// Cuts the JSON object out of a reply: first `{` through last `}`, fences removed.
fn extract_json(raw: &str) -> Result<String, QueryError> {
    let start = raw.find('{');
    let end = raw.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(raw[start..=end]
            .replace("```json", "")
            .replace("```", "")
            .trim()
            .to_string()),
        _ => Err(QueryError::Translation(
            "No valid JSON found in response".to_string(),
        )),
    }
}

fn parse_candidate(raw: &str, question: &str) -> Result<SqlCandidate, QueryError> {
    let payload = extract_json(raw)?;
    let envelope: Value = serde_json::from_str(&payload)
        .map_err(|e| QueryError::Translation(format!("Error in model response format: {}", e)))?;

    let sql_query = match envelope.get("sql_query") {
        Some(Value::String(sql)) => sql.clone(),
        Some(other) => {
            return Err(QueryError::Translation(format!(
                "'sql_query' must be a string, got {}",
                other
            )))
        }
        None => {
            return Err(QueryError::Translation(
                "Model response does not contain 'sql_query'".to_string(),
            ))
        }
    };

    let original_query = envelope
        .get("original_query")
        .and_then(Value::as_str)
        .unwrap_or(question)
        .to_string();

    let confidence = envelope
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    Ok(SqlCandidate {
        sql_query,
        original_query,
        confidence,
    })
}

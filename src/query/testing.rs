//! Deterministic collaborators for pipeline tests.

use crate::db::executor::QueryExecutor;
use crate::db::rows::{Row, RowSet};
use crate::db::DbError;
use crate::llm::{LlmError, TextGenerator};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replies with queued responses in order and records every prompt it receives.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    healthy: bool,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            healthy: true,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new(Vec::<String>::new())
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

/// Returns a fixed row set and counts how often it was asked to execute.
pub struct StaticExecutor {
    rows: RowSet,
    calls: AtomicUsize,
    healthy: bool,
}

impl StaticExecutor {
    pub fn new(rows: RowSet) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
            healthy: true,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for StaticExecutor {
    async fn execute(&self, _sql: &str) -> Result<RowSet, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

/// `count` rows shaped like `{"id": i, "name": "product-NN", "price": ...}`.
pub fn product_rows(count: usize) -> RowSet {
    (0..count)
        .map(|i| {
            let value = json!({
                "id": i,
                "name": format!("product-{:02}", i),
                "price": 10.0 + i as f64,
            });
            match value {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
        .collect()
}

/// Model reply wrapping `sql` in the JSON envelope the translator expects.
pub fn sql_reply(sql: &str) -> String {
    format!("```json\n{}\n```", json!({ "sql_query": sql, "confidence": 0.9 }))
}

use crate::db::rows::Row;
use crate::llm::{LlmError, TextGenerator};
use crate::query::error::QueryError;
use serde_json::Value;
use tracing::info;

/// Rows beyond this many are left out of the narration prompt.
pub const NARRATION_ROW_LIMIT: usize = 10;

/// Narrates a result set in plain language.
pub struct AnswerComposer<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> AnswerComposer<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }

    pub async fn compose(&self, rows: &[Row], question: &str) -> Result<String, QueryError> {
        info!("Generating natural response for {} results", rows.len());

        let prompt = build_prompt(rows, question);
        let answer = self.generator.generate(&prompt).await?.trim().to_string();
        if answer.is_empty() {
            return Err(QueryError::Generation(LlmError::EmptyResponse));
        }

        info!("Natural response generated: {} characters", answer.len());
        Ok(answer)
    }
}

fn build_prompt(rows: &[Row], question: &str) -> String {
    let limited = Value::Array(
        rows.iter()
            .take(NARRATION_ROW_LIMIT)
            .cloned()
            .map(Value::Object)
            .collect(),
    );

    format!(
        r#"
You are an e-commerce assistant that answers questions about the store using data from its database.

INSTRUCTIONS:
- Respond in English, naturally and conversationally
- Be concise but informative
- If there is no data, say so plainly and in a friendly way
- Include relevant figures from the data (names, prices, quantities, etc.)
- For products, mention names, prices and availability when relevant
- For users, mention general information without sensitive data
- For orders, include totals and statuses
- Do NOT use markup or special formatting characters like *, **, # or backticks

ORIGINAL QUESTION: {question}

DATABASE DATA:
{limited:#}

Generate a natural and helpful response based on this data:
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::testing::{product_rows, ScriptedGenerator};

    #[tokio::test]
    async fn test_prompt_is_capped_at_ten_rows() {
        let generator = ScriptedGenerator::new(["Here are the products."]);
        let rows = product_rows(15);

        AnswerComposer::new(&generator)
            .compose(&rows, "list products")
            .await
            .unwrap();

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("product-00"));
        assert!(prompt.contains("product-09"));
        assert!(!prompt.contains("product-10"));
        assert!(!prompt.contains("product-14"));
        assert_eq!(prompt.matches("\"name\"").count(), NARRATION_ROW_LIMIT);
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let generator = ScriptedGenerator::new(["\n  We have 2 laptops in stock.  \n"]);
        let answer = AnswerComposer::new(&generator)
            .compose(&product_rows(2), "how many laptops?")
            .await
            .unwrap();

        assert_eq!(answer, "We have 2 laptops in stock.");
    }

    #[tokio::test]
    async fn test_blank_answer_is_generation_error() {
        let generator = ScriptedGenerator::new(["   "]);
        let result = AnswerComposer::new(&generator).compose(&[], "anything?").await;

        assert!(matches!(
            result,
            Err(QueryError::Generation(LlmError::EmptyResponse))
        ));
    }

    #[tokio::test]
    async fn test_empty_result_set_still_narrated() {
        let generator = ScriptedGenerator::new(["No products match."]);
        AnswerComposer::new(&generator)
            .compose(&[], "any tablets?")
            .await
            .unwrap();

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("ORIGINAL QUESTION: any tablets?"));
        assert!(prompt.contains("DATABASE DATA:\n[]"));
    }
}

use crate::db::executor::QueryExecutor;
use crate::db::schema::SchemaDescriptor;
use crate::llm::TextGenerator;
use crate::query::composer::AnswerComposer;
use crate::query::error::QueryError;
use crate::query::models::{
    HealthReport, NaturalLanguageQuery, PipelineStage, QueryOutcome, SafetyVerdict, ServiceHealth,
};
use crate::query::safety::{DenylistGate, SafetyGate};
use crate::query::translator::QueryTranslator;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Translate, vet, execute and narrate one question.
///
/// Collaborators are injected once and shared across requests; a run holds no lock
/// and keeps no state beyond its own locals.
pub struct QueryPipeline {
    generator: Option<Arc<dyn TextGenerator>>,
    executor: Option<Arc<dyn QueryExecutor>>,
    gate: Box<dyn SafetyGate>,
    schema: SchemaDescriptor,
}

impl QueryPipeline {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        executor: Option<Arc<dyn QueryExecutor>>,
        schema: SchemaDescriptor,
    ) -> Self {
        Self {
            generator,
            executor,
            gate: Box::new(DenylistGate),
            schema,
        }
    }

    pub fn with_gate(mut self, gate: impl SafetyGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub fn generator_name(&self) -> Option<&str> {
        self.generator.as_deref().map(|g| g.name())
    }

    pub async fn process(&self, query: &NaturalLanguageQuery) -> Result<QueryOutcome, QueryError> {
        let started = Instant::now();
        let mut stage = PipelineStage::Start;
        info!("Processing query: {}", query);

        let result = self.run(query, started, &mut stage).await;
        match &result {
            Ok(outcome) => info!("Query processed successfully in {:.2}s", outcome.execution_time),
            Err(e) if e.is_client_error() => warn!("Query rejected after stage {}: {}", stage, e),
            Err(e) => error!("Query failed after stage {}: {}", stage, e),
        }
        result
    }

    async fn run(
        &self,
        query: &NaturalLanguageQuery,
        started: Instant,
        stage: &mut PipelineStage,
    ) -> Result<QueryOutcome, QueryError> {
        let (generator, executor) = self.collaborators()?;
        advance(stage, PipelineStage::ServicesChecked);

        let candidate = QueryTranslator::new(generator)
            .translate(query.as_str(), self.schema.as_str())
            .await?;
        advance(stage, PipelineStage::Translated);

        if let SafetyVerdict::Unsafe { reason } = self.gate.check(&candidate.sql_query) {
            return Err(QueryError::SecurityRejection(reason));
        }
        advance(stage, PipelineStage::SafetyChecked);

        let rows = executor.execute(&candidate.sql_query).await?;
        advance(stage, PipelineStage::Executed);

        let answer = AnswerComposer::new(generator)
            .compose(&rows, query.as_str())
            .await?;
        advance(stage, PipelineStage::Composed);

        let outcome = QueryOutcome {
            answer,
            sql_query: candidate.sql_query,
            execution_time: started.elapsed().as_secs_f64(),
        };
        advance(stage, PipelineStage::Done);
        Ok(outcome)
    }

    /// Both collaborators, or every missing one named in a single error.
    fn collaborators(&self) -> Result<(&dyn TextGenerator, &dyn QueryExecutor), QueryError> {
        match (self.generator.as_deref(), self.executor.as_deref()) {
            (Some(generator), Some(executor)) => Ok((generator, executor)),
            (generator, executor) => {
                let mut missing = Vec::new();
                if executor.is_none() {
                    missing.push("Database is not configured".to_string());
                }
                if generator.is_none() {
                    missing.push("LLM is not configured".to_string());
                }
                Err(QueryError::Configuration(missing))
            }
        }
    }

    pub async fn health(&self) -> HealthReport {
        let database = async {
            match &self.executor {
                Some(executor) => executor.health_check().await,
                None => false,
            }
        };
        let llm = async {
            match &self.generator {
                Some(generator) => generator.health_check().await,
                None => false,
            }
        };
        let (database, llm) = tokio::join!(database, llm);

        HealthReport::from_services(ServiceHealth { database, llm })
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    debug!("Pipeline stage: {} -> {}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor::DuckDbExecutor;
    use crate::db::Database;
    use crate::query::models::HealthStatus;
    use crate::query::testing::{product_rows, sql_reply, ScriptedGenerator, StaticExecutor};

    fn pipeline(generator: &Arc<ScriptedGenerator>, executor: &Arc<StaticExecutor>) -> QueryPipeline {
        QueryPipeline::new(
            Some(generator.clone() as Arc<dyn TextGenerator>),
            Some(executor.clone() as Arc<dyn QueryExecutor>),
            SchemaDescriptor::ecommerce(),
        )
    }

    fn question(text: &str) -> NaturalLanguageQuery {
        NaturalLanguageQuery::parse(text).unwrap()
    }

    #[tokio::test]
    async fn test_show_all_users() {
        let generator = Arc::new(ScriptedGenerator::new([
            sql_reply("SELECT * FROM users"),
            "There are three users: Ana, Ben and Cleo.".to_string(),
        ]));
        let executor = Arc::new(StaticExecutor::new(product_rows(3)));

        let outcome = pipeline(&generator, &executor)
            .process(&question("show all users"))
            .await
            .unwrap();

        assert_eq!(outcome.sql_query, "SELECT * FROM users");
        assert_eq!(outcome.answer, "There are three users: Ana, Ben and Cleo.");
        assert!(outcome.execution_time >= 0.0);
        assert_eq!(executor.calls(), 1);
        assert_eq!(generator.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_unsafe_sql_never_reaches_executor() {
        let generator = Arc::new(ScriptedGenerator::new([sql_reply("DROP TABLE users")]));
        let executor = Arc::new(StaticExecutor::new(product_rows(3)));

        let result = pipeline(&generator, &executor)
            .process(&question("delete everything"))
            .await;

        assert!(matches!(result, Err(QueryError::SecurityRejection(_))));
        assert_eq!(executor.calls(), 0);
        // No narration was requested either.
        assert_eq!(generator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_composer_sees_capped_rows() {
        let generator = Arc::new(ScriptedGenerator::new([
            sql_reply("SELECT * FROM products"),
            "Fifteen products.".to_string(),
        ]));
        let executor = Arc::new(StaticExecutor::new(product_rows(15)));

        pipeline(&generator, &executor)
            .process(&question("list products"))
            .await
            .unwrap();

        let narration_prompt = &generator.prompts()[1];
        assert!(narration_prompt.contains("product-09"));
        assert!(!narration_prompt.contains("product-10"));
    }

    #[tokio::test]
    async fn test_identical_runs_give_identical_outcomes() {
        let generator = Arc::new(ScriptedGenerator::new([
            sql_reply("SELECT name FROM products"),
            "Two products.".to_string(),
            sql_reply("SELECT name FROM products"),
            "Two products.".to_string(),
        ]));
        let executor = Arc::new(StaticExecutor::new(product_rows(2)));
        let pipeline = pipeline(&generator, &executor);
        let q = question("product names");

        let first = pipeline.process(&q).await.unwrap();
        let second = pipeline.process(&q).await.unwrap();

        assert_eq!(first.sql_query, second.sql_query);
        assert_eq!(first.answer, second.answer);
        assert_eq!(generator.prompts()[0], generator.prompts()[2]);
        assert_eq!(generator.prompts()[1], generator.prompts()[3]);
    }

    #[tokio::test]
    async fn test_missing_collaborators_are_aggregated() {
        let pipeline = QueryPipeline::new(None, None, SchemaDescriptor::ecommerce());

        match pipeline.process(&question("show all users")).await {
            Err(QueryError::Configuration(missing)) => assert_eq!(missing.len(), 2),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_generator_only() {
        let executor = Arc::new(StaticExecutor::new(Vec::new()));
        let pipeline = QueryPipeline::new(
            None,
            Some(executor.clone() as Arc<dyn QueryExecutor>),
            SchemaDescriptor::ecommerce(),
        );

        match pipeline.process(&question("show all users")).await {
            Err(QueryError::Configuration(missing)) => {
                assert_eq!(missing, vec!["LLM is not configured".to_string()])
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_translation_failure_stops_pipeline() {
        let generator = Arc::new(ScriptedGenerator::new(["I cannot help with that."]));
        let executor = Arc::new(StaticExecutor::new(product_rows(3)));

        let result = pipeline(&generator, &executor).process(&question("??")).await;

        assert!(matches!(result, Err(QueryError::Translation(_))));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_gate_is_consulted() {
        struct RejectAll;
        impl SafetyGate for RejectAll {
            fn check(&self, _sql: &str) -> SafetyVerdict {
                SafetyVerdict::Unsafe {
                    reason: "closed".to_string(),
                }
            }
        }

        let generator = Arc::new(ScriptedGenerator::new([sql_reply("SELECT 1")]));
        let executor = Arc::new(StaticExecutor::new(Vec::new()));
        let result = pipeline(&generator, &executor)
            .with_gate(RejectAll)
            .process(&question("one"))
            .await;

        assert!(matches!(result, Err(QueryError::SecurityRejection(reason)) if reason == "closed"));
    }

    #[tokio::test]
    async fn test_against_duckdb() {
        let db = Database::in_memory();
        db.run(|conn| {
            conn.execute_batch(
                "INSERT INTO users (id, name, email) VALUES
                    ('u1', 'Ana', 'ana@example.com'),
                    ('u2', 'Ben', 'ben@example.com'),
                    ('u3', 'Cleo', 'cleo@example.com');",
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let generator = Arc::new(ScriptedGenerator::new([
            sql_reply("SELECT name FROM users ORDER BY name"),
            "Ana, Ben and Cleo are registered.".to_string(),
        ]));
        let pipeline = QueryPipeline::new(
            Some(generator.clone() as Arc<dyn TextGenerator>),
            Some(Arc::new(DuckDbExecutor::new(db)) as Arc<dyn QueryExecutor>),
            SchemaDescriptor::ecommerce(),
        );

        let outcome = pipeline.process(&question("who is registered?")).await.unwrap();
        assert_eq!(outcome.answer, "Ana, Ben and Cleo are registered.");

        let narration_prompt = &generator.prompts()[1];
        assert!(narration_prompt.contains("\"Ana\""));
        assert!(narration_prompt.contains("\"Cleo\""));
    }

    #[tokio::test]
    async fn test_health_reflects_collaborators() {
        let healthy = pipeline(
            &Arc::new(ScriptedGenerator::new(Vec::<String>::new())),
            &Arc::new(StaticExecutor::new(Vec::new())),
        );
        assert_eq!(healthy.health().await.status, HealthStatus::Healthy);

        let degraded = pipeline(
            &Arc::new(ScriptedGenerator::unhealthy()),
            &Arc::new(StaticExecutor::new(Vec::new())),
        );
        let report = degraded.health().await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(!report.services.llm);

        let database_down = pipeline(
            &Arc::new(ScriptedGenerator::new(Vec::<String>::new())),
            &Arc::new(StaticExecutor::unhealthy()),
        );
        let report = database_down.health().await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(!report.services.database);
        assert!(report.services.llm);
        assert_eq!(report.message, "Problems with: database");

        let unconfigured = QueryPipeline::new(None, None, SchemaDescriptor::ecommerce());
        assert_eq!(unconfigured.health().await.status, HealthStatus::Unhealthy);
    }
}

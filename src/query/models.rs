use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Query cannot be empty")]
pub struct EmptyQuery;

/// Free-text question from a client; never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalLanguageQuery(String);

impl NaturalLanguageQuery {
    pub fn parse(raw: &str) -> Result<Self, EmptyQuery> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NaturalLanguageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SQL proposed by the model for one question.
///
/// `confidence` is reported by the model and kept for logging; nothing gates on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlCandidate {
    pub sql_query: String,
    pub original_query: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    Safe,
    Unsafe { reason: String },
}

impl SafetyVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyVerdict::Safe)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub sql_query: String,
    /// Wall-clock seconds from pipeline start to the composed answer.
    pub execution_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    ServicesChecked,
    Translated,
    SafetyChecked,
    Executed,
    Composed,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Start => "start",
            PipelineStage::ServicesChecked => "services_checked",
            PipelineStage::Translated => "translated",
            PipelineStage::SafetyChecked => "safety_checked",
            PipelineStage::Executed => "executed",
            PipelineStage::Composed => "composed",
            PipelineStage::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub database: bool,
    pub llm: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub services: ServiceHealth,
    pub message: String,
}

impl HealthReport {
    pub fn from_services(services: ServiceHealth) -> Self {
        let status = match (services.database, services.llm) {
            (true, true) => HealthStatus::Healthy,
            (false, false) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };

        let message = match status {
            HealthStatus::Healthy => "All services are working correctly".to_string(),
            HealthStatus::Unhealthy => {
                "Critical services unavailable - check your configuration".to_string()
            }
            HealthStatus::Degraded => {
                let mut problems = Vec::new();
                if !services.database {
                    problems.push("database");
                }
                if !services.llm {
                    problems.push("llm");
                }
                format!("Problems with: {}", problems.join(", "))
            }
        };

        Self {
            status,
            services,
            message,
        }
    }
}

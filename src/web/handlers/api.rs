use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::query::models::HealthStatus;
use crate::query::{HealthReport, NaturalLanguageQuery, QueryOutcome};
use crate::web::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HumanQueryRequest {
    pub human_query: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub report: HealthReport,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceBanner {
    pub message: String,
    pub version: String,
    pub health: String,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub service: String,
    pub version: String,
    pub llm_provider: String,
    pub llm_model: String,
    pub llm_configured: bool,
    pub database_provider: String,
    pub uptime_seconds: i64,
    pub timestamp: String,
}

pub async fn root() -> Json<ServiceBanner> {
    Json(ServiceBanner {
        message: "NL Shop natural language query API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        health: "/api/v1/health".to_string(),
    })
}

pub async fn process_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HumanQueryRequest>, JsonRejection>,
) -> Result<Json<QueryOutcome>, ApiError> {
    let Json(payload) = payload?;
    let query = NaturalLanguageQuery::parse(&payload.human_query)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    debug!("NL-query: {}", query);

    let outcome = state
        .pipeline
        .process(&query)
        .await
        .map_err(|e| ApiError::query(e, state.debug()))?;

    Ok(Json(outcome))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.pipeline.health().await;
    let status = if report.status == HealthStatus::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            report,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

pub async fn system_info(State(state): State<Arc<AppState>>) -> Json<SystemInfo> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    Json(SystemInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm_provider: state.config.llm.backend.clone(),
        llm_model: state.config.llm.model.clone(),
        llm_configured: state.pipeline.generator_name().is_some(),
        database_provider: "duckdb".to_string(),
        uptime_seconds: uptime,
        timestamp: now.to_rfc3339(),
    })
}

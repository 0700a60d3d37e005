use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::models::{Order, OrderCreate, OrderStatus, OrderValidation};
use crate::web::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub order: Order,
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: Result<Json<OrderCreate>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let Json(payload) = payload?;
    payload.validate().map_err(ApiError::bad_request)?;

    let order = state
        .orders
        .create(&user_id, payload.items)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(order))
}

pub async fn list_user_orders(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .orders
        .list_for_user(&user_id)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(orders))
}

pub async fn list_orders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .orders
        .list()
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state
        .orders
        .get(&id)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order not found"))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<StatusParams>,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
    let status: OrderStatus = params.status.parse().map_err(ApiError::bad_request)?;

    let order = state
        .orders
        .update_status(&id, status)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?
        .ok_or_else(|| ApiError::not_found("Order not found or failed to update"))?;

    Ok(Json(StatusUpdateResponse {
        message: format!("Order status updated to {}", status),
        order,
    }))
}

pub async fn validate_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OrderCreate>, JsonRejection>,
) -> Result<Json<OrderValidation>, ApiError> {
    let Json(payload) = payload?;
    let validation = state
        .orders
        .validate(payload.items)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(validation))
}

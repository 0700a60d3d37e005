use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::models::{Product, ProductCreate, ProductFilter, ProductListResponse, ProductUpdate};
use crate::web::error::ApiError;
use crate::web::handlers::MessageResponse;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeaturedParams {
    #[serde(default = "default_featured_limit")]
    pub limit: u32,
}

fn default_featured_limit() -> u32 {
    8
}

#[derive(Debug, Deserialize)]
pub struct StockParams {
    pub new_stock: i32,
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let page = state
        .products
        .list(filter)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(page))
}

pub async fn featured_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeaturedParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .products
        .featured(params.limit)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(products))
}

pub async fn categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let categories = state
        .products
        .categories()
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(categories))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .products
        .get(&id)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProductCreate>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(payload) = payload?;
    let product = state
        .products
        .create(payload)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(payload) = payload?;
    state
        .products
        .update(&id, payload)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state
        .products
        .delete(&id)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;

    if !deleted {
        return Err(ApiError::not_found("Product not found"));
    }
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<StockParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    let updated = state
        .products
        .set_stock(&id, params.new_stock)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;

    if !updated {
        return Err(ApiError::not_found("Product not found"));
    }
    Ok(Json(MessageResponse::new(format!(
        "Stock updated successfully to {}",
        params.new_stock
    ))))
}

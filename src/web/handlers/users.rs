use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::models::{User, UserCreate, UserUpdate};
use crate::web::error::ApiError;
use crate::web::handlers::MessageResponse;
use crate::web::state::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UserCreate>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(payload) = payload?;
    let user = state
        .users
        .create(payload)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(user))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state
        .users
        .list()
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .get(&id)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn get_user_by_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .get_by_email(&email)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(payload) = payload?;
    state
        .users
        .update(&id, payload)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state
        .users
        .delete(&id)
        .await
        .map_err(|e| ApiError::db(e, state.debug()))?;

    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

pub fn root_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(handlers::api::root))
}

// API Routes - REST API under /api/v1
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api/v1",
        Router::new()
            // Natural language queries
            .route("/query", post(handlers::api::process_query))
            .route("/health", get(handlers::api::health))
            .route("/info", get(handlers::api::system_info))
            // Products
            .route(
                "/products",
                get(handlers::products::list_products).post(handlers::products::create_product),
            )
            .route("/products/featured", get(handlers::products::featured_products))
            .route("/products/categories", get(handlers::products::categories))
            .route(
                "/products/{id}",
                get(handlers::products::get_product)
                    .put(handlers::products::update_product)
                    .delete(handlers::products::delete_product),
            )
            .route("/products/{id}/update-stock", post(handlers::products::update_stock))
            // Users
            .route("/users", get(handlers::users::list_users))
            .route("/users/register", post(handlers::users::register))
            .route("/users/email/{email}", get(handlers::users::get_user_by_email))
            .route(
                "/users/{id}",
                get(handlers::users::get_user)
                    .put(handlers::users::update_user)
                    .delete(handlers::users::delete_user),
            )
            // Orders
            .route("/orders", get(handlers::orders::list_orders))
            .route("/orders/validate", post(handlers::orders::validate_order))
            .route(
                "/orders/user/{user_id}",
                get(handlers::orders::list_user_orders).post(handlers::orders::create_order),
            )
            .route("/orders/{id}", get(handlers::orders::get_order))
            .route("/orders/{id}/status", put(handlers::orders::update_status)),
    )
}

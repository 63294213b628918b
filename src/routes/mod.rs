use axum::{Router, http::Uri, routing::get};

use crate::{error::AppError, state::AppState};

pub mod admin;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payment;
pub mod products;
pub mod users;

/// Everything mounted under `/api`. Role gates need the state up front, the
/// state itself is bound once by [`create_app`].
pub fn create_api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router(state))
        .merge(products::router(state))
        .merge(cart::router(state))
        .merge(orders::router(state))
        .merge(admin::router(state))
        .merge(payment::router())
}

/// The full application without transport layers (tracing, CORS, limits),
/// which `main` adds on top.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router(&state))
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path()))
}

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;

use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, Result};

use crate::db::{Database, UserStore};
use crate::middleware::AuthenticatedAdmin;
use crate::security::revocation::RevocationStore;
use crate::security::token::TokenCodec;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: config::Config,
    pub codec: Arc<TokenCodec>,
    pub users: Arc<dyn UserStore>,
    pub revocations: Arc<dyn RevocationStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ping", get(ping))
        .nest("/api/v1", api::routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Authenticated probe; exercises the full admin gate.
async fn ping(_admin: AuthenticatedAdmin) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

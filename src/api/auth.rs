use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::services::SessionService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let service = SessionService::new(
        state.codec.clone(),
        state.users.clone(),
        state.revocations.clone(),
    );
    let issued = service.login(&payload.username, &payload.password).await?;

    // Only the token string leaves the service; its id and expiry stay
    // internal for revocation bookkeeping.
    Ok(Json(LoginResponse {
        access_token: issued.token,
    }))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let service = SessionService::new(
        state.codec.clone(),
        state.users.clone(),
        state.revocations.clone(),
    );
    service.logout(token).await?;

    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

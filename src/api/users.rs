use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedAdmin;
use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::security::password;
use crate::AppState;

/// Every user route requires the administrator gate.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

async fn create_user(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let password_hash = password::hash_password(&payload.password)?;
    let user = user_repo::create_user(&state.db.pg, &payload, &password_hash).await?;
    tracing::info!(username = %user.username, by = %admin.subject, "user created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

async fn list_users(
    State(state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let skip = query.skip.unwrap_or(0).max(0);

    let users = user_repo::list_users(&state.db.pg, limit, skip).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

async fn get_user(
    State(state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let id = parse_id(&id)?;
    let user = user_repo::get_user(&state.db.pg, id).await?;
    Ok(Json(user.into()))
}

async fn update_user(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let id = parse_id(&id)?;

    let password_hash = match payload.password.as_deref() {
        Some(new_password) => Some(password::hash_password(new_password)?),
        None => None,
    };

    let user = user_repo::update_user(&state.db.pg, id, &payload, password_hash).await?;
    tracing::info!(username = %user.username, by = %admin.subject, "user updated");

    Ok(Json(user.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    user_repo::deactivate_user(&state.db.pg, id).await?;
    tracing::info!(%id, by = %admin.subject, "user deactivated");

    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid user ID".to_string()))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::blog_repo;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedAdmin;
use crate::models::{BlogResponse, CreateBlogRequest, UpdateBlogRequest};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_blogs).post(create_blog))
        .route(
            "/:id",
            get(get_blog).put(update_blog).delete(delete_blog),
        )
        .route("/slug/:slug", get(get_blog_by_slug))
}

async fn create_blog(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<BlogResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let post = blog_repo::create_blog(&state.db.pg, &payload).await?;
    tracing::info!(slug = %post.slug, by = %admin.subject, "blog created");

    Ok((StatusCode::CREATED, Json(post.into())))
}

#[derive(Debug, Deserialize)]
pub struct ListBlogsQuery {
    pub published: Option<bool>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<ListBlogsQuery>,
) -> Result<Json<Vec<BlogResponse>>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let skip = query.skip.unwrap_or(0).max(0);

    let posts = blog_repo::list_blogs(&state.db.pg, query.published, limit, skip).await?;
    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogResponse>> {
    let id = parse_id(&id)?;
    let post = blog_repo::get_blog(&state.db.pg, id).await?;
    Ok(Json(post.into()))
}

async fn get_blog_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogResponse>> {
    let post = blog_repo::get_blog_by_slug(&state.db.pg, &slug).await?;
    Ok(Json(post.into()))
}

async fn update_blog(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBlogRequest>,
) -> Result<Json<BlogResponse>> {
    let id = parse_id(&id)?;
    let post = blog_repo::update_blog(&state.db.pg, id, &payload).await?;
    tracing::info!(slug = %post.slug, by = %admin.subject, "blog updated");

    Ok(Json(post.into()))
}

async fn delete_blog(
    State(state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    blog_repo::delete_blog(&state.db.pg, id).await?;
    tracing::info!(%id, by = %admin.subject, "blog deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid blog ID".to_string()))
}

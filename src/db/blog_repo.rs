//! Blog post storage.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::conflict_on_unique;
use crate::error::{AppError, Result};
use crate::models::{BlogPost, CreateBlogRequest, UpdateBlogRequest};

pub async fn create_blog(pool: &PgPool, req: &CreateBlogRequest) -> Result<BlogPost> {
    let post = sqlx::query_as::<_, BlogPost>(
        r#"
        INSERT INTO blogs (id, title, slug, summary, content, cover_image, tags, published)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.title)
    .bind(&req.slug)
    .bind(req.summary.as_deref())
    .bind(&req.content)
    .bind(req.cover_image.as_deref())
    .bind(&req.tags)
    .bind(req.published)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Slug already exists"))?;

    Ok(post)
}

pub async fn list_blogs(
    pool: &PgPool,
    published: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<Vec<BlogPost>> {
    let posts = sqlx::query_as::<_, BlogPost>(
        r#"
        SELECT * FROM blogs
        WHERE $1::boolean IS NULL OR published = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(published)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn get_blog(pool: &PgPool, id: Uuid) -> Result<BlogPost> {
    sqlx::query_as::<_, BlogPost>("SELECT * FROM blogs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".to_string()))
}

pub async fn get_blog_by_slug(pool: &PgPool, slug: &str) -> Result<BlogPost> {
    sqlx::query_as::<_, BlogPost>("SELECT * FROM blogs WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".to_string()))
}

pub async fn update_blog(pool: &PgPool, id: Uuid, req: &UpdateBlogRequest) -> Result<BlogPost> {
    sqlx::query_as::<_, BlogPost>(
        r#"
        UPDATE blogs SET
            title = COALESCE($2, title),
            slug = COALESCE($3, slug),
            summary = COALESCE($4, summary),
            content = COALESCE($5, content),
            cover_image = COALESCE($6, cover_image),
            tags = COALESCE($7, tags),
            published = COALESCE($8, published),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.title.as_deref())
    .bind(req.slug.as_deref())
    .bind(req.summary.as_deref())
    .bind(req.content.as_deref())
    .bind(req.cover_image.as_deref())
    .bind(req.tags.as_ref())
    .bind(req.published)
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Slug already exists"))?
    .ok_or_else(|| AppError::NotFound("Blog not found".to_string()))
}

pub async fn delete_blog(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Blog not found".to_string()));
    }
    Ok(())
}

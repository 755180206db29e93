//! User storage. CRUD operations are plain pool queries; the login path
//! goes through the narrower `UserStore` lookup seam so the session layer
//! does not depend on the full repository surface.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::conflict_on_unique;
use crate::error::{AppError, Result};
use crate::models::{CreateUserRequest, UpdateUserRequest, User};

/// Identity lookup used by the session layer.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Resolve an active user by login identity.
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 AND is_active = TRUE",
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

pub async fn create_user(
    pool: &PgPool,
    req: &CreateUserRequest,
    password_hash: &str,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password_hash, is_admin)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.username)
    .bind(&req.email)
    .bind(password_hash)
    .bind(req.is_admin)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Username already exists"))?;

    Ok(user)
}

pub async fn list_users(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    req: &UpdateUserRequest,
    password_hash: Option<String>,
) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            email = COALESCE($2, email),
            password_hash = COALESCE($3, password_hash),
            is_admin = COALESCE($4, is_admin),
            is_active = COALESCE($5, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.email.as_deref())
    .bind(password_hash)
    .bind(req.is_admin)
    .bind(req.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Soft delete: the record stays for audit, the account stops resolving.
pub async fn deactivate_user(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query(
        "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}

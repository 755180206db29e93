//! Administrator gate applied to protected routes.
//!
//! Extracting `AuthenticatedAdmin` in a handler runs the full check chain:
//! bearer extraction, token decryption, revocation lookup, admin predicate.
//! Each step short-circuits with 401/403; a store failure is 503, never a
//! pass. Which cryptographic check failed is logged but not revealed to
//! the client.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// The validated administrator identity, available to protected handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub subject: String,
    pub token_id: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;

        let claims = state.codec.decode(token).map_err(|err| {
            tracing::debug!("bearer token rejected: {}", err);
            AppError::InvalidToken
        })?;

        if state.revocations.is_revoked(claims.jti).await? {
            tracing::debug!(token_id = %claims.jti, "revoked token presented");
            return Err(AppError::TokenRevoked);
        }

        if claims.sub != state.config.auth.admin_identity {
            tracing::warn!(subject = %claims.sub, "non-admin subject on protected route");
            return Err(AppError::Forbidden);
        }

        Ok(AuthenticatedAdmin {
            subject: claims.sub,
            token_id: claims.jti,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

//! Session lifecycle: login issues a token, logout revokes one.

use chrono::DateTime;
use std::sync::Arc;

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::RevocationRecord;
use crate::security::password;
use crate::security::revocation::RevocationStore;
use crate::security::token::{IssuedToken, TokenCodec};

pub struct SessionService {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationStore>,
}

impl SessionService {
    pub fn new(
        codec: Arc<TokenCodec>,
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            codec,
            users,
            revocations,
        }
    }

    /// Authenticate and issue a session token.
    ///
    /// Unknown identity and wrong password both produce the same
    /// `InvalidCredentials`, so responses cannot be used to enumerate
    /// usernames.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let user = self
            .users
            .find_by_identity(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        password::verify_password(password, &user.password_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        let issued = self.codec.issue(&user.username, None)?;

        tracing::info!(
            subject = %user.username,
            token_id = %issued.token_id,
            expires_at = %issued.expires_at,
            "session opened"
        );

        Ok(issued)
    }

    /// Revoke the presented token.
    ///
    /// An expired or undecodable token is rejected as invalid; a lapsed
    /// session has nothing left to revoke.
    pub async fn logout(&self, token: &str) -> Result<()> {
        let claims = self.codec.decode(token).map_err(|err| {
            tracing::debug!("logout rejected: {}", err);
            AppError::InvalidToken
        })?;

        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(AppError::InvalidToken)?;

        let record = RevocationRecord::new(claims.jti, claims.sub.clone(), expires_at);
        self.revocations.add(record).await?;

        tracing::info!(subject = %claims.sub, token_id = %claims.jti, "session revoked");
        Ok(())
    }
}

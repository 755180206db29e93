//! Revocation registry for logged-out tokens.
//!
//! Tokens are self-validating, so logout works through a shared blacklist
//! instead of a server-side session table: the token's `jti` is recorded
//! here and every protected request checks the registry after decoding the
//! bearer token. Records carry the token's own expiry, and the backing
//! store drops them once expiry plus a retention window has passed, which
//! bounds storage growth without a sweep job.
//!
//! All lookups fail closed: if the store cannot answer within the bounded
//! timeout, callers see `ServiceUnavailable` rather than "not revoked".

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, Result};
use crate::models::RevocationRecord;

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Persist a revocation record. Idempotent: re-adding an already
    /// revoked `token_id` is a no-op, so a retried logout never fails.
    async fn add(&self, record: RevocationRecord) -> Result<()>;

    /// Whether a live revocation record exists for `token_id`. Called on
    /// every protected request, after token decryption.
    async fn is_revoked(&self, token_id: Uuid) -> Result<bool>;
}

/// Redis-backed registry. Revocations are visible to every service
/// instance as soon as `add` returns, and records expire natively via
/// absolute TTL at `expires_at + retention`.
pub struct RedisRevocationStore {
    client: redis::Client,
    retention: Duration,
    op_timeout: std::time::Duration,
}

const KEY_PREFIX: &str = "blog:revoked:jti:";

impl RedisRevocationStore {
    pub fn new(client: redis::Client, cfg: &AuthConfig) -> Self {
        Self {
            client,
            retention: Duration::hours(cfg.revocation_retention_hours as i64),
            op_timeout: std::time::Duration::from_secs(cfg.store_timeout_secs),
        }
    }

    fn key(token_id: Uuid) -> String {
        format!("{}{}", KEY_PREFIX, token_id)
    }

    /// Unix timestamp at which the record may be dropped.
    fn retention_deadline(&self, expires_at: DateTime<Utc>) -> i64 {
        (expires_at + self.retention).timestamp()
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        with_timeout(self.op_timeout, self.client.get_multiplexed_async_connection()).await
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn add(&self, record: RevocationRecord) -> Result<()> {
        let key = Self::key(record.token_id);
        let deadline = self.retention_deadline(record.expires_at);
        let payload =
            serde_json::to_string(&record).map_err(|e| AppError::Internal(e.into()))?;

        let mut conn = self.connection().await?;
        let outcome: Option<String> = with_timeout(self.op_timeout, async {
            redis::cmd("SET")
                .arg(&key)
                .arg(&payload)
                .arg("NX")
                .arg("EXAT")
                .arg(deadline)
                .query_async(&mut conn)
                .await
        })
        .await?;

        if outcome.is_none() {
            tracing::debug!(token_id = %record.token_id, "revocation record already present");
        } else {
            tracing::info!(
                token_id = %record.token_id,
                principal = %record.principal_id,
                "token revoked, record retained until {}",
                deadline
            );
        }
        Ok(())
    }

    async fn is_revoked(&self, token_id: Uuid) -> Result<bool> {
        let mut conn = self.connection().await?;
        with_timeout(self.op_timeout, async {
            redis::cmd("EXISTS")
                .arg(Self::key(token_id))
                .query_async(&mut conn)
                .await
        })
        .await
    }
}

/// Bound a store operation; both IO errors and timeouts surface as
/// `ServiceUnavailable` so an unanswered revocation check can never pass as
/// "not revoked".
async fn with_timeout<T, F>(duration: std::time::Duration, fut: F) -> Result<T>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!("revocation store error: {}", e);
            Err(AppError::ServiceUnavailable)
        }
        Err(_) => {
            tracing::error!("revocation store operation timed out");
            Err(AppError::ServiceUnavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RedisRevocationStore {
        let cfg = AuthConfig {
            private_key_path: "keys/private_key.pem".to_string(),
            public_key_path: "keys/public_key.pem".to_string(),
            key_algorithm: "RSA-OAEP-256".to_string(),
            content_algorithm: "A256GCM".to_string(),
            token_ttl_hours: 24,
            revocation_retention_hours: 48,
            admin_identity: "admin@example.com".to_string(),
            store_timeout_secs: 5,
        };
        let client = redis::Client::open("redis://127.0.0.1:6379").unwrap();
        RedisRevocationStore::new(client, &cfg)
    }

    #[test]
    fn test_key_namespacing() {
        let id = Uuid::new_v4();
        let key = RedisRevocationStore::key(id);
        assert!(key.starts_with("blog:revoked:jti:"));
        assert!(key.ends_with(&id.to_string()));
    }

    #[test]
    fn test_retention_deadline_extends_expiry() {
        let store = store();
        let expires_at = Utc::now() + Duration::hours(24);
        let deadline = store.retention_deadline(expires_at);
        assert_eq!(deadline, (expires_at + Duration::hours(48)).timestamp());
    }
}

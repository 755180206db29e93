use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A token that must no longer be honored even though it has not expired.
///
/// Records are created on logout and are immutable afterwards. `expires_at`
/// is copied from the token so storage can drop the record once the token
/// would have lapsed on its own (plus a retention window kept for audit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationRecord {
    pub token_id: Uuid,
    pub principal_id: String,
    pub revoked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RevocationRecord {
    pub fn new(token_id: Uuid, principal_id: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_id,
            principal_id,
            revoked_at: Utc::now(),
            expires_at,
        }
    }

    /// Whether the revoked token would have expired on its own by now.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_record_json_round_trip() {
        let record = RevocationRecord::new(
            Uuid::new_v4(),
            "admin@example.com".to_string(),
            Utc::now() + Duration::hours(24),
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: RevocationRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.token_id, record.token_id);
        assert_eq!(back.principal_id, record.principal_id);
        assert_eq!(back.expires_at, record.expires_at);
    }

    #[test]
    fn test_is_expired() {
        let live = RevocationRecord::new(
            Uuid::new_v4(),
            "admin@example.com".to_string(),
            Utc::now() + Duration::hours(1),
        );
        assert!(!live.is_expired());

        let lapsed = RevocationRecord::new(
            Uuid::new_v4(),
            "admin@example.com".to_string(),
            Utc::now() - Duration::hours(1),
        );
        assert!(lapsed.is_expired());
    }
}

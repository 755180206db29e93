//! Session-token codec.
//!
//! Claims are serialized to JSON and sealed with a two-layer scheme: a fresh
//! random content key encrypts the claims with AES-GCM, and the RSA public
//! key wraps that content key with OAEP. The result is a compact URL-safe
//! string of five dot-separated base64 segments:
//!
//! `header . encrypted_key . nonce . ciphertext . tag`
//!
//! The header names the key-wrap and content-encryption algorithms and is
//! bound into the GCM authentication as associated data, so neither the
//! header nor the ciphertext can be altered without detection. On decode the
//! header algorithms are checked against the configured pair before any
//! cryptographic work happens.
//!
//! Decoding is pure computation over the key material; the revocation
//! registry is a separate policy check owned by the caller.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::security::keys::KeyMaterial;

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    #[error("token decryption failed")]
    DecryptionFailed,

    #[error("token expired")]
    Expired,

    #[error("token issuance failed: {0}")]
    Issuance(String),
}

/// Identity and lifetime data carried inside a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Unique per-issuance identifier; the revocation key.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// A freshly issued token plus the identifiers callers need to register a
/// revocation later without re-parsing the token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyWrapAlgorithm {
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
}

impl KeyWrapAlgorithm {
    fn padding(self) -> Oaep {
        match self {
            KeyWrapAlgorithm::RsaOaep => Oaep::new::<Sha1>(),
            KeyWrapAlgorithm::RsaOaep256 => Oaep::new::<Sha256>(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyWrapAlgorithm::RsaOaep => "RSA-OAEP",
            KeyWrapAlgorithm::RsaOaep256 => "RSA-OAEP-256",
        }
    }
}

impl std::str::FromStr for KeyWrapAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RSA-OAEP" => Ok(KeyWrapAlgorithm::RsaOaep),
            "RSA-OAEP-256" => Ok(KeyWrapAlgorithm::RsaOaep256),
            other => Err(format!("unsupported key algorithm: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentAlgorithm {
    #[serde(rename = "A128GCM")]
    A128Gcm,
    #[serde(rename = "A256GCM")]
    A256Gcm,
}

impl ContentAlgorithm {
    fn key_len(self) -> usize {
        match self {
            ContentAlgorithm::A128Gcm => 16,
            ContentAlgorithm::A256Gcm => 32,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentAlgorithm::A128Gcm => "A128GCM",
            ContentAlgorithm::A256Gcm => "A256GCM",
        }
    }
}

impl std::str::FromStr for ContentAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A128GCM" => Ok(ContentAlgorithm::A128Gcm),
            "A256GCM" => Ok(ContentAlgorithm::A256Gcm),
            other => Err(format!("unsupported content algorithm: {}", other)),
        }
    }
}

/// Algorithm header embedded as the first token segment.
#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: KeyWrapAlgorithm,
    enc: ContentAlgorithm,
}

/// Encrypts claim sets into tokens and decrypts tokens back into claims.
///
/// Operations are pure functions over the immutable key material, so a
/// single codec is shared across request handlers without locking.
pub struct TokenCodec {
    keys: Arc<KeyMaterial>,
    key_algorithm: KeyWrapAlgorithm,
    content_algorithm: ContentAlgorithm,
    default_ttl: Duration,
}

impl TokenCodec {
    pub fn new(
        keys: Arc<KeyMaterial>,
        key_algorithm: KeyWrapAlgorithm,
        content_algorithm: ContentAlgorithm,
        default_ttl: Duration,
    ) -> Self {
        Self {
            keys,
            key_algorithm,
            content_algorithm,
            default_ttl,
        }
    }

    pub fn from_config(keys: Arc<KeyMaterial>, cfg: &AuthConfig) -> anyhow::Result<Self> {
        let key_algorithm: KeyWrapAlgorithm = cfg
            .key_algorithm
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        let content_algorithm: ContentAlgorithm = cfg
            .content_algorithm
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;

        tracing::debug!(
            alg = key_algorithm.as_str(),
            enc = content_algorithm.as_str(),
            ttl_hours = cfg.token_ttl_hours,
            "token codec configured"
        );

        Ok(Self::new(
            keys,
            key_algorithm,
            content_algorithm,
            Duration::hours(cfg.token_ttl_hours as i64),
        ))
    }

    /// Issue a token for `subject`, valid for `ttl` (the configured default
    /// when `None`).
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<IssuedToken, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::Issuance("subject must not be empty".to_string()));
        }
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl <= Duration::zero() {
            return Err(TokenError::Issuance("ttl must be positive".to_string()));
        }

        let claims = Claims::new(subject, ttl);
        let token = self.encrypt_claims(&claims)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenError::Issuance("expiry out of range".to_string()))?;

        Ok(IssuedToken {
            token,
            token_id: claims.jti,
            expires_at,
        })
    }

    /// Decrypt and validate a token, returning its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 5 {
            return Err(TokenError::Malformed("expected five segments"));
        }

        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0])
            .map_err(|_| TokenError::Malformed("header encoding"))?;
        let header: TokenHeader = serde_json::from_slice(&header_bytes)
            .map_err(|_| TokenError::Malformed("header structure"))?;

        // Pin the advertised algorithms to the configured pair before doing
        // any cryptographic work.
        if header.alg != self.key_algorithm || header.enc != self.content_algorithm {
            return Err(TokenError::Malformed("unexpected algorithm header"));
        }

        let encrypted_key = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| TokenError::Malformed("key segment encoding"))?;
        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| TokenError::Malformed("nonce encoding"))?;
        let ciphertext = URL_SAFE_NO_PAD
            .decode(parts[3])
            .map_err(|_| TokenError::Malformed("ciphertext encoding"))?;
        let tag = URL_SAFE_NO_PAD
            .decode(parts[4])
            .map_err(|_| TokenError::Malformed("tag encoding"))?;

        if nonce_bytes.len() != NONCE_SIZE {
            return Err(TokenError::Malformed("nonce length"));
        }
        if tag.len() != TAG_SIZE {
            return Err(TokenError::Malformed("tag length"));
        }

        let cek = self
            .keys
            .private_key()
            .decrypt(self.key_algorithm.padding(), &encrypted_key)
            .map_err(|_| TokenError::DecryptionFailed)?;
        if cek.len() != self.content_algorithm.key_len() {
            return Err(TokenError::DecryptionFailed);
        }

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);
        let payload = Payload {
            msg: &sealed,
            aad: parts[0].as_bytes(),
        };
        let nonce = Nonce::from_slice(&nonce_bytes);
        let plaintext = match self.content_algorithm {
            ContentAlgorithm::A128Gcm => Aes128Gcm::new_from_slice(&cek)
                .map_err(|_| TokenError::DecryptionFailed)?
                .decrypt(nonce, payload),
            ContentAlgorithm::A256Gcm => Aes256Gcm::new_from_slice(&cek)
                .map_err(|_| TokenError::DecryptionFailed)?
                .decrypt(nonce, payload),
        }
        .map_err(|_| TokenError::DecryptionFailed)?;

        let claims: Claims = serde_json::from_slice(&plaintext)
            .map_err(|_| TokenError::Malformed("claims structure"))?;

        if Utc::now().timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn encrypt_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = TokenHeader {
            alg: self.key_algorithm,
            enc: self.content_algorithm,
        };
        let header_json = serde_json::to_vec(&header)
            .map_err(|e| TokenError::Issuance(format!("header serialization: {}", e)))?;
        let header_b64 = URL_SAFE_NO_PAD.encode(header_json);

        let plaintext = serde_json::to_vec(claims)
            .map_err(|e| TokenError::Issuance(format!("claims serialization: {}", e)))?;

        let mut cek = vec![0u8; self.content_algorithm.key_len()];
        rand::thread_rng().fill_bytes(&mut cek);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let encrypted_key = self
            .keys
            .public_key()
            .encrypt(&mut rand::thread_rng(), self.key_algorithm.padding(), &cek)
            .map_err(|e| TokenError::Issuance(format!("content key wrap: {}", e)))?;

        let payload = Payload {
            msg: &plaintext,
            aad: header_b64.as_bytes(),
        };
        let nonce = Nonce::from_slice(&nonce_bytes);
        let sealed = match self.content_algorithm {
            ContentAlgorithm::A128Gcm => Aes128Gcm::new_from_slice(&cek)
                .map_err(|_| TokenError::Issuance("invalid content key length".to_string()))?
                .encrypt(nonce, payload),
            ContentAlgorithm::A256Gcm => Aes256Gcm::new_from_slice(&cek)
                .map_err(|_| TokenError::Issuance("invalid content key length".to_string()))?
                .encrypt(nonce, payload),
        }
        .map_err(|_| TokenError::Issuance("content encryption failed".to_string()))?;

        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

        let segments = [
            header_b64,
            URL_SAFE_NO_PAD.encode(&encrypted_key),
            URL_SAFE_NO_PAD.encode(nonce_bytes),
            URL_SAFE_NO_PAD.encode(ciphertext),
            URL_SAFE_NO_PAD.encode(tag),
        ];
        Ok(segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::test_keys::{
        OTHER_PRIVATE_KEY, OTHER_PUBLIC_KEY, TEST_PRIVATE_KEY, TEST_PUBLIC_KEY,
    };
    use std::collections::HashSet;

    fn test_codec(alg: KeyWrapAlgorithm, enc: ContentAlgorithm) -> TokenCodec {
        let keys = KeyMaterial::from_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY, "development")
            .expect("test keys should parse");
        TokenCodec::new(Arc::new(keys), alg, enc, Duration::hours(1))
    }

    fn default_codec() -> TokenCodec {
        test_codec(KeyWrapAlgorithm::RsaOaep256, ContentAlgorithm::A256Gcm)
    }

    /// Rebuild a token with one base64 segment replaced.
    fn with_segment(token: &str, index: usize, segment: &str) -> String {
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[index] = segment;
        parts.join(".")
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let codec = default_codec();
        let issued = codec.issue("admin@example.com", None).unwrap();

        assert_eq!(issued.token.matches('.').count(), 4);

        let claims = codec.decode(&issued.token).unwrap();
        assert_eq!(claims.sub, "admin@example.com");
        assert_eq!(claims.jti, issued.token_id);
        assert_eq!(claims.exp, claims.iat + 3600);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_round_trip_with_oaep_sha1_and_a128gcm() {
        let codec = test_codec(KeyWrapAlgorithm::RsaOaep, ContentAlgorithm::A128Gcm);
        let issued = codec.issue("admin@example.com", None).unwrap();
        let claims = codec.decode(&issued.token).unwrap();
        assert_eq!(claims.sub, "admin@example.com");
    }

    #[test]
    fn test_issuances_are_distinct() {
        let codec = default_codec();
        let mut tokens = HashSet::new();
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let issued = codec.issue("admin@example.com", None).unwrap();
            tokens.insert(issued.token);
            ids.insert(issued.token_id);
        }
        assert_eq!(tokens.len(), 100);
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_token_ids_pairwise_distinct() {
        let ids: HashSet<Uuid> = (0..10_000)
            .map(|_| Claims::new("admin@example.com", Duration::hours(1)).jti)
            .collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_empty_subject_rejected() {
        let codec = default_codec();
        assert!(matches!(
            codec.issue("", None),
            Err(TokenError::Issuance(_))
        ));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let codec = default_codec();
        assert!(matches!(
            codec.issue("admin@example.com", Some(Duration::seconds(0))),
            Err(TokenError::Issuance(_))
        ));
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let codec = default_codec();
        let issued = codec.issue("admin@example.com", None).unwrap();

        let parts: Vec<&str> = issued.token.split('.').collect();
        let mut ciphertext = URL_SAFE_NO_PAD.decode(parts[3]).unwrap();
        ciphertext[0] ^= 0x01;
        let tampered = with_segment(&issued.token, 3, &URL_SAFE_NO_PAD.encode(&ciphertext));

        assert!(matches!(
            codec.decode(&tampered),
            Err(TokenError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_tag_rejected() {
        let codec = default_codec();
        let issued = codec.issue("admin@example.com", None).unwrap();

        let parts: Vec<&str> = issued.token.split('.').collect();
        let mut tag = URL_SAFE_NO_PAD.decode(parts[4]).unwrap();
        tag[0] ^= 0x01;
        let tampered = with_segment(&issued.token, 4, &URL_SAFE_NO_PAD.encode(&tag));

        assert!(matches!(
            codec.decode(&tampered),
            Err(TokenError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_wrong_private_key_rejected() {
        let codec = default_codec();
        let other_keys = KeyMaterial::from_pem(OTHER_PRIVATE_KEY, OTHER_PUBLIC_KEY, "development")
            .expect("second test pair should parse");
        let other_codec = TokenCodec::new(
            Arc::new(other_keys),
            KeyWrapAlgorithm::RsaOaep256,
            ContentAlgorithm::A256Gcm,
            Duration::hours(1),
        );

        let issued = codec.issue("admin@example.com", None).unwrap();
        assert!(matches!(
            other_codec.decode(&issued.token),
            Err(TokenError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_algorithm_header_is_pinned() {
        let codec = default_codec();
        let issued = codec.issue("admin@example.com", None).unwrap();

        // Rewrite the header to advertise a different (still supported)
        // algorithm pair.
        let forged_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RSA-OAEP","enc":"A128GCM"}"#);
        let forged = with_segment(&issued.token, 0, &forged_header);

        assert!(matches!(
            codec.decode(&forged),
            Err(TokenError::Malformed("unexpected algorithm header"))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = default_codec();
        let now = Utc::now();
        let claims = Claims {
            sub: "admin@example.com".to_string(),
            jti: Uuid::new_v4(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };

        // Cryptographically intact, just past its expiry.
        let token = codec.encrypt_claims(&claims).unwrap();
        assert!(matches!(codec.decode(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_is_malformed_not_a_crash() {
        let codec = default_codec();
        for garbage in [
            "",
            "not-a-token",
            "a.b.c",
            "a.b.c.d.e",
            "!!!.###.$$$.%%%.&&&",
        ] {
            assert!(matches!(
                codec.decode(garbage),
                Err(TokenError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_algorithms_parse_from_config_strings() {
        assert_eq!(
            "RSA-OAEP-256".parse::<KeyWrapAlgorithm>().unwrap(),
            KeyWrapAlgorithm::RsaOaep256
        );
        assert_eq!(
            "A128GCM".parse::<ContentAlgorithm>().unwrap(),
            ContentAlgorithm::A128Gcm
        );
        assert!("RSA1_5".parse::<KeyWrapAlgorithm>().is_err());
        assert!("A256CBC".parse::<ContentAlgorithm>().is_err());
    }
}

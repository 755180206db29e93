//! Key material for the session-token codec.
//!
//! The RSA key pair is loaded once at startup and handed to the codec by
//! reference; nothing else in the process reads the key files. Missing or
//! unparsable keys abort startup, since the service cannot issue or
//! validate a single token without them.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fs;

/// SHA-256 fingerprints of sample key pairs that ship with the development
/// tooling and test suite. Production refuses to start with any of these.
const PLACEHOLDER_FINGERPRINTS: &[&str] = &[
    "c92d4ddaf9645c4dded5b44fe1b143a68c9f683156ad2e4336ef2563ea061980",
];

#[derive(Debug, thiserror::Error)]
pub enum KeyMaterialError {
    #[error("key material unavailable: {0}")]
    Unavailable(String),

    #[error("placeholder key pair refused in {0} environment")]
    PlaceholderKey(String),
}

/// Immutable RSA key pair: public key encrypts content keys at issuance,
/// private key unwraps them at validation.
pub struct KeyMaterial {
    public_key: RsaPublicKey,
    private_key: RsaPrivateKey,
    fingerprint: String,
}

impl KeyMaterial {
    /// Load the key pair from PEM files at the configured locations.
    pub fn load(
        private_key_path: &str,
        public_key_path: &str,
        environment: &str,
    ) -> Result<Self, KeyMaterialError> {
        let private_pem = fs::read_to_string(private_key_path).map_err(|e| {
            KeyMaterialError::Unavailable(format!("read {}: {}", private_key_path, e))
        })?;
        let public_pem = fs::read_to_string(public_key_path).map_err(|e| {
            KeyMaterialError::Unavailable(format!("read {}: {}", public_key_path, e))
        })?;

        Self::from_pem(&private_pem, &public_pem, environment)
    }

    pub fn from_pem(
        private_pem: &str,
        public_pem: &str,
        environment: &str,
    ) -> Result<Self, KeyMaterialError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .map_err(|e| KeyMaterialError::Unavailable(format!("parse private key: {}", e)))?;
        let public_key = RsaPublicKey::from_public_key_pem(public_pem)
            .map_err(|e| KeyMaterialError::Unavailable(format!("parse public key: {}", e)))?;

        let fingerprint = hex::encode(Sha256::digest(public_pem.trim().as_bytes()));

        if environment == "production"
            && PLACEHOLDER_FINGERPRINTS.contains(&fingerprint.as_str())
        {
            return Err(KeyMaterialError::PlaceholderKey(environment.to_string()));
        }

        Ok(Self {
            public_key,
            private_key,
            fingerprint,
        })
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Hex SHA-256 of the public key PEM, for startup logging.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::test_keys::{TEST_PRIVATE_KEY, TEST_PUBLIC_KEY};

    #[test]
    fn test_load_from_pem() {
        let keys = KeyMaterial::from_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY, "development")
            .expect("test key pair should parse");
        assert_eq!(keys.fingerprint().len(), 64);
    }

    #[test]
    fn test_garbage_pem_is_unavailable() {
        let result = KeyMaterial::from_pem("not a key", TEST_PUBLIC_KEY, "development");
        assert!(matches!(result, Err(KeyMaterialError::Unavailable(_))));

        let result = KeyMaterial::from_pem(TEST_PRIVATE_KEY, "not a key", "development");
        assert!(matches!(result, Err(KeyMaterialError::Unavailable(_))));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = KeyMaterial::load(
            "/nonexistent/private_key.pem",
            "/nonexistent/public_key.pem",
            "development",
        );
        assert!(matches!(result, Err(KeyMaterialError::Unavailable(_))));
    }

    #[test]
    fn test_placeholder_pair_refused_in_production() {
        let result = KeyMaterial::from_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY, "production");
        assert!(matches!(result, Err(KeyMaterialError::PlaceholderKey(_))));
    }

    #[test]
    fn test_placeholder_pair_allowed_in_development() {
        assert!(KeyMaterial::from_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY, "development").is_ok());
    }
}

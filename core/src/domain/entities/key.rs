//! Signing key entity owned by the key store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported signing algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// Symmetric HMAC-SHA256 (keys derived from the root secret)
    HS256,
    /// Asymmetric RSA-SHA256 (key pair supplied as PEM)
    RS256,
}

impl KeyAlgorithm {
    /// Maps to the jsonwebtoken algorithm identifier
    pub fn jwt_algorithm(&self) -> jsonwebtoken::Algorithm {
        match self {
            KeyAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            KeyAlgorithm::RS256 => jsonwebtoken::Algorithm::RS256,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlgorithm::HS256 => "HS256",
            KeyAlgorithm::RS256 => "RS256",
        }
    }
}

/// A signing key held by the key store.
///
/// Exactly one key is current (used for new signatures) at any time; older
/// keys stay valid for verification until they age out of the store. The
/// secret material never leaves the token subsystem.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    /// Key identifier, carried in the JWT header as `kid`
    pub key_id: String,

    /// Signing algorithm
    pub algorithm: KeyAlgorithm,

    /// HMAC secret material (empty for RS256, which signs via the PEM pair)
    pub secret: Vec<u8>,

    /// When the key was created
    pub created_at: DateTime<Utc>,

    /// When the key stops being acceptable for verification
    pub expires_at: DateTime<Utc>,

    /// Whether the key is still retained for verification
    pub is_active: bool,

    /// Number of signatures produced with this key
    pub use_count: u64,
}

impl SigningKey {
    /// Creates a new HMAC key with the given secret and verification lifetime.
    pub fn new_hmac(secret: Vec<u8>, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            key_id: Uuid::new_v4().to_string(),
            algorithm: KeyAlgorithm::HS256,
            secret,
            created_at: now,
            expires_at: now + lifetime,
            is_active: true,
            use_count: 0,
        }
    }

    /// Checks if the key has aged past its verification lifetime
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Checks if the key may still verify signatures
    pub fn is_verifiable(&self) -> bool {
        self.is_active && !self.is_expired()
    }
}

// Manual Debug: the secret must never end up in logs.
impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("is_active", &self.is_active)
            .field("use_count", &self.use_count)
            .finish()
    }
}

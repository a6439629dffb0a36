//! Signing key store with scheduled rotation and graceful rollover.

use std::collections::VecDeque;
use std::fs;
use std::sync::RwLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rand::RngCore;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde_json::{json, Value as JsonValue};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::entities::key::{KeyAlgorithm, SigningKey};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::secret::SecretProvider;

use super::config::TokenServiceConfig;

/// Static RS256 key pair loaded from PEM files.
#[derive(Clone)]
struct Rs256KeyPair {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    kid: String,
    /// RSA public modulus, base64url-encoded for JWKS
    n: String,
    /// RSA public exponent, base64url-encoded for JWKS
    e: String,
}

impl Rs256KeyPair {
    fn from_pem_strings(private_pem: &str, public_pem: &str) -> DomainResult<Self> {
        let encoding_key =
            EncodingKey::from_rsa_pem(private_pem.as_bytes()).map_err(|e| DomainError::Internal {
                message: format!("invalid private key format: {}", e),
            })?;
        let decoding_key =
            DecodingKey::from_rsa_pem(public_pem.as_bytes()).map_err(|e| DomainError::Internal {
                message: format!("invalid public key format: {}", e),
            })?;

        let public = RsaPublicKey::from_public_key_pem(public_pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(public_pem))
            .map_err(|e| DomainError::Internal {
                message: format!("unreadable RSA public key: {}", e),
            })?;

        let n = URL_SAFE_NO_PAD.encode(public.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public.e().to_bytes_be());

        // Stable key id derived from the public key itself
        let mut hasher = Sha256::new();
        hasher.update(public_pem.as_bytes());
        let kid = hex::encode(&hasher.finalize()[..8]);

        Ok(Self {
            encoding_key,
            decoding_key,
            kid,
            n,
            e,
        })
    }

    fn from_pem_files(private_path: &str, public_path: &str) -> DomainResult<Self> {
        let private_pem = fs::read_to_string(private_path).map_err(|e| DomainError::Internal {
            message: format!("failed to read private key: {}", e),
        })?;
        let public_pem = fs::read_to_string(public_path).map_err(|e| DomainError::Internal {
            message: format!("failed to read public key: {}", e),
        })?;
        Self::from_pem_strings(&private_pem, &public_pem)
    }
}

struct KeyRing {
    /// Retained keys, oldest first
    keys: VecDeque<SigningKey>,
    /// Key id currently used for new signatures
    current: Option<String>,
}

/// Holds the signing keys and performs rotation.
///
/// Verification takes a read lock only; rotation and lazy key creation take
/// the write lock briefly. Rotation never invalidates tokens signed under a
/// previous key before their natural expiry: old keys stay in the ring for
/// verification until they fall off the `max_active_keys` window, after
/// which verification fails closed.
pub struct SigningKeyStore {
    inner: RwLock<KeyRing>,
    root_material: Vec<u8>,
    key_lifetime: Duration,
    max_active_keys: usize,
    rs256: Option<Rs256KeyPair>,
}

impl SigningKeyStore {
    /// Fetches root material from the secret provider and builds the store.
    ///
    /// For HS256 the provider's material seeds per-key derivation; a provider
    /// failure here is fatal to issuance. For RS256 the PEM pair configured
    /// in `config.rs256` is loaded instead.
    pub async fn initialize(
        provider: &dyn SecretProvider,
        config: &TokenServiceConfig,
    ) -> DomainResult<Self> {
        let (root_material, rs256) = match config.algorithm {
            KeyAlgorithm::HS256 => {
                let material = provider
                    .root_key_material()
                    .await
                    .map_err(|_| DomainError::Token(TokenError::KeyUnavailable))?;
                (material, None)
            }
            KeyAlgorithm::RS256 => {
                let rs256_config = config.rs256.as_ref().ok_or_else(|| DomainError::Internal {
                    message: "RS256 algorithm requires key configuration".to_string(),
                })?;
                let pair = Rs256KeyPair::from_pem_files(
                    &rs256_config.private_key_path,
                    &rs256_config.public_key_path,
                )?;
                (Vec::new(), Some(pair))
            }
        };

        Ok(Self {
            inner: RwLock::new(KeyRing {
                keys: VecDeque::new(),
                current: None,
            }),
            root_material,
            key_lifetime: Duration::hours(config.key_lifetime_hours),
            max_active_keys: config.max_active_keys,
            rs256,
        })
    }

    /// Whether scheduled rotation applies (derived HS256 keys only; a static
    /// RS256 pair is replaced out of band).
    pub fn supports_rotation(&self) -> bool {
        self.rs256.is_none()
    }

    /// Key used for new signatures, creating one lazily when none is active
    /// or all retained keys have expired. Counts the signature against the
    /// key's `use_count`.
    pub fn signing_key(&self) -> DomainResult<(String, EncodingKey, Algorithm)> {
        if let Some(pair) = &self.rs256 {
            return Ok((pair.kid.clone(), pair.encoding_key.clone(), Algorithm::RS256));
        }

        let mut ring = self
            .inner
            .write()
            .map_err(|_| DomainError::internal("key store lock poisoned"))?;

        let needs_new = match &ring.current {
            Some(kid) => !ring
                .keys
                .iter()
                .any(|k| &k.key_id == kid && k.is_verifiable()),
            None => true,
        };
        if needs_new {
            self.install_new_key(&mut ring)?;
        }

        let current_id = ring
            .current
            .clone()
            .ok_or(DomainError::Token(TokenError::KeyUnavailable))?;
        let key = ring
            .keys
            .iter_mut()
            .find(|k| k.key_id == current_id)
            .ok_or(DomainError::Token(TokenError::KeyUnavailable))?;

        key.use_count += 1;
        Ok((
            key.key_id.clone(),
            EncodingKey::from_secret(&key.secret),
            key.algorithm.jwt_algorithm(),
        ))
    }

    /// Resolves a verification key by `kid`, falling back to the current key
    /// when the header carries none. Returns `None` for unknown or evicted
    /// key ids: verification fails closed past the retention window.
    pub fn verification_key(&self, kid: Option<&str>) -> Option<(String, DecodingKey, Algorithm)> {
        if let Some(pair) = &self.rs256 {
            return match kid {
                Some(k) if k != pair.kid => None,
                _ => Some((pair.kid.clone(), pair.decoding_key.clone(), Algorithm::RS256)),
            };
        }

        let key = match kid {
            Some(k) => self.key_for(k),
            None => self.current(),
        }?;

        if !key.is_verifiable() {
            return None;
        }
        Some((
            key.key_id.clone(),
            DecodingKey::from_secret(&key.secret),
            key.algorithm.jwt_algorithm(),
        ))
    }

    /// Generates a new key, marks it current, and demotes the previous
    /// current key to verify-only. Keys beyond `max_active_keys` are evicted.
    pub fn rotate(&self) -> DomainResult<SigningKey> {
        if self.rs256.is_some() {
            return Err(DomainError::internal(
                "static RS256 key pair does not rotate",
            ));
        }

        let mut ring = self
            .inner
            .write()
            .map_err(|_| DomainError::internal("key store lock poisoned"))?;
        let key = self.install_new_key(&mut ring)?;
        info!(kid = %key.key_id, "signing key rotated");
        Ok(key)
    }

    /// Snapshot of the current signing key, if any
    pub fn current(&self) -> Option<SigningKey> {
        let ring = self.inner.read().ok()?;
        let id = ring.current.clone()?;
        ring.keys.iter().find(|k| k.key_id == id).cloned()
    }

    /// Snapshot of a retained key by id
    pub fn key_for(&self, kid: &str) -> Option<SigningKey> {
        let ring = self.inner.read().ok()?;
        ring.keys.iter().find(|k| k.key_id == kid).cloned()
    }

    /// Number of keys currently retained for verification
    pub fn key_count(&self) -> usize {
        self.inner.read().map(|ring| ring.keys.len()).unwrap_or(0)
    }

    /// Public key set for asymmetric deployments. Empty for HS256, whose
    /// secrets never leave the subsystem.
    pub fn jwks(&self) -> JsonValue {
        match &self.rs256 {
            Some(pair) => json!({
                "keys": [{
                    "kty": "RSA",
                    "use": "sig",
                    "alg": "RS256",
                    "kid": pair.kid,
                    "n": pair.n,
                    "e": pair.e,
                }]
            }),
            None => json!({ "keys": [] }),
        }
    }

    fn install_new_key(&self, ring: &mut KeyRing) -> DomainResult<SigningKey> {
        if self.root_material.is_empty() {
            return Err(DomainError::Token(TokenError::KeyUnavailable));
        }

        let key = self.derive_key();
        ring.current = Some(key.key_id.clone());
        ring.keys.push_back(key.clone());

        while ring.keys.len() > self.max_active_keys {
            if let Some(mut evicted) = ring.keys.pop_front() {
                evicted.is_active = false;
            }
        }

        Ok(key)
    }

    /// Derives fresh HMAC secret material from the root seed and a random
    /// nonce, so no two keys ever share material even under the same root.
    fn derive_key(&self) -> SigningKey {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);

        let mut hasher = Sha256::new();
        hasher.update(&self.root_material);
        hasher.update([0x1f]);
        hasher.update(nonce);

        SigningKey::new_hmac(hasher.finalize().to_vec(), self.key_lifetime)
    }
}

//! Configuration for the token service

use crate::domain::entities::key::KeyAlgorithm;
use crate::domain::entities::token::{
    ACCESS_TOKEN_EXPIRY_SECONDS, JWT_ISSUER, REFRESH_TOKEN_EXPIRY_DAYS,
};

use super::risk::RiskConfig;

/// RS256 key pair locations for asymmetric deployments
#[derive(Debug, Clone)]
pub struct Rs256KeyConfig {
    /// Path to the PEM-encoded private key file
    pub private_key_path: String,
    /// Path to the PEM-encoded public key file
    pub public_key_path: String,
}

impl Rs256KeyConfig {
    /// Creates config from environment variables
    pub fn from_env() -> Option<Self> {
        let private_key_path = std::env::var("TD_JWT_PRIVATE_KEY_PATH").ok()?;
        let public_key_path = std::env::var("TD_JWT_PUBLIC_KEY_PATH").ok()?;
        Some(Self {
            private_key_path,
            public_key_path,
        })
    }
}

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Issuer claim stamped on and required from every token
    pub issuer: String,
    /// Signing algorithm
    pub algorithm: KeyAlgorithm,
    /// Access token expiry in seconds
    pub access_token_expiry_seconds: i64,
    /// Refresh token expiry in days
    pub refresh_token_expiry_days: i64,
    /// Maximum refresh-chain depth before permanent revocation
    pub max_rotation_depth: u32,
    /// How many keys stay available for verification after rotation
    pub max_active_keys: usize,
    /// Verification lifetime of each signing key, in hours. Must cover at
    /// least one full refresh-token lifetime so rotation never strands
    /// outstanding tokens.
    pub key_lifetime_hours: i64,
    /// Blacklist capacity before FIFO eviction
    pub max_blacklist_size: usize,
    /// Suspicious-use scoring knobs
    pub risk: RiskConfig,
    /// RS256 key material (required when `algorithm` is RS256)
    pub rs256: Option<Rs256KeyConfig>,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            issuer: JWT_ISSUER.to_string(),
            algorithm: KeyAlgorithm::HS256,
            access_token_expiry_seconds: ACCESS_TOKEN_EXPIRY_SECONDS,
            refresh_token_expiry_days: REFRESH_TOKEN_EXPIRY_DAYS,
            max_rotation_depth: 10,
            max_active_keys: 3,
            // 31 days: one refresh lifetime plus slack
            key_lifetime_hours: 31 * 24,
            max_blacklist_size: 10_000,
            risk: RiskConfig::default(),
            rs256: None,
        }
    }
}

impl TokenServiceConfig {
    /// Builds a config from environment variables, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(issuer) = std::env::var("TD_JWT_ISSUER") {
            config.issuer = issuer;
        }
        if let Some(seconds) = env_i64("TD_ACCESS_TOKEN_EXPIRY_SECONDS") {
            config.access_token_expiry_seconds = seconds;
        }
        if let Some(days) = env_i64("TD_REFRESH_TOKEN_EXPIRY_DAYS") {
            config.refresh_token_expiry_days = days;
        }
        if let Some(depth) = env_i64("TD_MAX_ROTATION_DEPTH") {
            config.max_rotation_depth = depth as u32;
        }
        if let Some(size) = env_i64("TD_MAX_BLACKLIST_SIZE") {
            config.max_blacklist_size = size as usize;
        }
        if let Some(rs256) = Rs256KeyConfig::from_env() {
            config.algorithm = KeyAlgorithm::RS256;
            config.rs256 = Some(rs256);
        }

        config
    }
}

fn env_i64(var: &str) -> Option<i64> {
    std::env::var(var).ok()?.parse().ok()
}

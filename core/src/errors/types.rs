//! Token-engine error types.
//!
//! Every variant here is local and non-retryable from the subsystem's point
//! of view; the calling layer decides whether a failure means
//! "re-authenticate", "fix your clock", or "go away".

use thiserror::Error;

/// Token validation and lifecycle failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Wrong segment count or undecodable segments. Always a client error.
    #[error("Malformed token")]
    MalformedToken,

    /// Cryptographic verification failed. Security relevant, audited.
    #[error("Token signature verification failed")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token not yet valid")]
    NotYetValid,

    /// Explicit or suspicious-activity revocation
    #[error("Token revoked: {reason}")]
    Revoked { reason: String },

    #[error("Missing required claim: {claim}")]
    MissingClaim { claim: String },

    #[error("Invalid token claims")]
    InvalidClaims,

    /// Recomputed client-binding hash did not match the stored one
    #[error("Client binding mismatch")]
    BindingMismatch,

    /// Token older than the caller's configured maximum age
    #[error("Token exceeds maximum age")]
    TokenTooOld,

    #[error("Wrong token type: expected {expected} token")]
    WrongTokenType { expected: &'static str },

    /// No valid signing key. Fatal for issuance; validation of existing
    /// tokens can still succeed against retained historical keys.
    #[error("No signing key available")]
    KeyUnavailable,

    /// Refresh chain depth exceeded; the token is permanently revoked
    #[error("Refresh rotation limit exceeded")]
    RotationLimitExceeded,

    #[error("Token generation failed")]
    GenerationFailed,
}

impl TokenError {
    /// Whether the failure should be audited as security relevant
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self,
            TokenError::InvalidSignature
                | TokenError::Revoked { .. }
                | TokenError::BindingMismatch
                | TokenError::RotationLimitExceeded
        )
    }
}

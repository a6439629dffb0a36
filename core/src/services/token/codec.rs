//! Wire codec for the three-segment signed token format.
//!
//! Pure and stateless: this layer guarantees that `header.payload.signature`
//! round-trips exactly and that signatures verify, nothing more. Business
//! validation (expiry, claims, blacklist) happens in the service layer.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value as JsonValue;

use crate::domain::entities::token::Claims;
use crate::errors::{DomainError, DomainResult, TokenError};

/// Structurally decoded token. The claims are parsed but NOT verified.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub header: Header,
    pub claims: JsonValue,
    pub signature: String,
}

/// Signs claims under the given key, stamping the key id into the header.
pub fn encode_token(
    claims: &Claims,
    kid: &str,
    algorithm: Algorithm,
    key: &EncodingKey,
) -> DomainResult<String> {
    let mut header = Header::new(algorithm);
    header.kid = Some(kid.to_string());
    encode(&header, claims, key).map_err(|_| DomainError::Token(TokenError::GenerationFailed))
}

/// Splits and parses a token without verifying the signature.
///
/// Enforces the canonical structure: exactly three non-empty base64url
/// segments, a JSON header, and a JSON object payload.
pub fn decode_token(token: &str) -> Result<DecodedToken, TokenError> {
    let mut segments = token.split('.');
    let (header_b64, payload_b64, signature) =
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
                (h, p, s)
            }
            _ => return Err(TokenError::MalformedToken),
        };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| TokenError::MalformedToken)?;
    let header: Header =
        serde_json::from_slice(&header_bytes).map_err(|_| TokenError::MalformedToken)?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::MalformedToken)?;
    let claims: JsonValue =
        serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::MalformedToken)?;
    if !claims.is_object() {
        return Err(TokenError::MalformedToken);
    }

    Ok(DecodedToken {
        header,
        claims,
        signature: signature.to_string(),
    })
}

/// Verifies the signature only. Temporal and claim checks are disabled here
/// so the validator controls their ordering and error mapping.
pub fn verify_signature(
    token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
) -> Result<JsonValue, TokenError> {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<JsonValue>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|_| TokenError::InvalidSignature)
}

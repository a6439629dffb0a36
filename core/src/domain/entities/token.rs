//! Token entities for the trust-domain SSO engine.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token expiration time (1 hour)
pub const ACCESS_TOKEN_EXPIRY_SECONDS: i64 = 3600;

/// Refresh token expiration time (30 days)
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

/// JWT issuer
pub const JWT_ISSUER: &str = "trustdomain";

/// Token type reported to callers in issuance results
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Session state a client product presents when requesting a token pair.
///
/// The engine does not persist any of this; the caller owns session storage
/// and passes the context again when exchanging a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Product (tenant) the tokens are scoped to; becomes the audience claim
    pub product_key: String,

    /// Central identity of the user; becomes the subject claim
    pub user_id: String,

    /// Organization the session belongs to
    pub organization_id: String,

    /// User identifier inside the client product, if linked
    pub external_user_id: Option<String>,

    /// User email, if the product is allowed to see it
    pub email: Option<String>,

    /// Granted scopes
    pub scopes: Vec<String>,

    /// Session identifier assigned by the authority
    pub session_id: String,

    /// Client IP at session establishment
    pub client_ip: Option<String>,

    /// User agent at session establishment
    pub user_agent: Option<String>,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer
    pub iss: String,

    /// Subject (central user ID)
    pub sub: String,

    /// Audience (product key of the consuming tenant)
    pub aud: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issued at timestamp
    pub iat: i64,

    /// JWT ID (unique identifier for the token)
    pub jti: String,

    /// Organization the session belongs to
    pub org_id: String,

    /// User identifier inside the client product
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_user_id: Option<String>,

    /// User email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Granted scopes
    pub scopes: Vec<String>,

    /// Session identifier
    pub session_id: String,

    /// JWT ID of the paired refresh token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_jti: Option<String>,

    /// One-way hash binding the token to the issuing client context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,

    /// Device fingerprint hash captured at issuance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl AccessClaims {
    /// Creates claims for a new access token bound to a session.
    pub fn new(session: &SessionContext, expiry_seconds: i64, refresh_jti: Option<String>) -> Self {
        let now = Utc::now();
        let expiry = now + Duration::seconds(expiry_seconds);

        Self {
            iss: JWT_ISSUER.to_string(),
            sub: session.user_id.clone(),
            aud: session.product_key.clone(),
            exp: expiry.timestamp(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            org_id: session.organization_id.clone(),
            external_user_id: session.external_user_id.clone(),
            email: session.email.clone(),
            scopes: session.scopes.clone(),
            session_id: session.session_id.clone(),
            refresh_jti,
            binding: None,
            fingerprint: None,
        }
    }
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Issuer
    pub iss: String,

    /// Subject (central user ID)
    pub sub: String,

    /// Audience (product key of the consuming tenant)
    pub aud: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issued at timestamp
    pub iat: i64,

    /// JWT ID (unique identifier for the token)
    pub jti: String,

    /// Organization the session belongs to
    pub org_id: String,

    /// Session identifier
    pub session_id: String,

    /// JWT ID of the paired access token
    pub access_jti: String,

    /// How many times this refresh chain has been rotated
    pub rotation_count: u32,
}

impl RefreshClaims {
    /// Creates claims for a new refresh token bound to a session.
    pub fn new(
        session: &SessionContext,
        expiry_days: i64,
        access_jti: String,
        rotation_count: u32,
    ) -> Self {
        let now = Utc::now();
        let expiry = now + Duration::days(expiry_days);

        Self {
            iss: JWT_ISSUER.to_string(),
            sub: session.user_id.clone(),
            aud: session.product_key.clone(),
            exp: expiry.timestamp(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            org_id: session.organization_id.clone(),
            session_id: session.session_id.clone(),
            access_jti,
            rotation_count,
        }
    }
}

/// Tagged union of token payloads, discriminated by the `type` field on the
/// wire so verifiers can tell the variants apart from the flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Claims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl Claims {
    /// JWT ID of the token
    pub fn jti(&self) -> &str {
        match self {
            Claims::Access(c) => &c.jti,
            Claims::Refresh(c) => &c.jti,
        }
    }

    /// Subject (central user ID)
    pub fn sub(&self) -> &str {
        match self {
            Claims::Access(c) => &c.sub,
            Claims::Refresh(c) => &c.sub,
        }
    }

    /// Audience (product key)
    pub fn aud(&self) -> &str {
        match self {
            Claims::Access(c) => &c.aud,
            Claims::Refresh(c) => &c.aud,
        }
    }

    /// Session identifier
    pub fn session_id(&self) -> &str {
        match self {
            Claims::Access(c) => &c.session_id,
            Claims::Refresh(c) => &c.session_id,
        }
    }

    /// Expiration timestamp
    pub fn exp(&self) -> i64 {
        match self {
            Claims::Access(c) => c.exp,
            Claims::Refresh(c) => c.exp,
        }
    }

    /// Issued-at timestamp
    pub fn iat(&self) -> i64 {
        match self {
            Claims::Access(c) => c.iat,
            Claims::Refresh(c) => c.iat,
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp()
    }

    /// Variant name used in logs and audit payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Claims::Access(_) => "access",
            Claims::Refresh(_) => "refresh",
        }
    }
}

/// Token pair returned to the caller at issuance. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Always "Bearer"
    pub token_type: String,

    /// Space-separated granted scopes
    pub scope: String,
}

impl TokenPair {
    /// Creates a new token pair
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        scopes: &[String],
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            scope: scopes.join(" "),
        }
    }
}

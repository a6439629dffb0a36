//! Per-token usage metadata tracked by the revocation registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known revocation reasons recorded on metadata and audit events.
pub mod reasons {
    pub const LOGOUT: &str = "logout";
    pub const SUSPICIOUS_ACTIVITY: &str = "suspicious_activity";
    pub const REFRESH_ROTATED: &str = "refresh_token_rotated";
    pub const ACCESS_ROTATED: &str = "access_token_rotated";
    pub const ROTATION_LIMIT: &str = "rotation_limit_exceeded";
    pub const ADMIN: &str = "administrative";
}

/// Side record keyed by the one-way hash of a serialized token.
///
/// Created at issuance, updated on each successful validation, stamped once
/// on revocation. After revocation or expiry the record is append-only
/// history until it is purged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// SHA-256 hash of the serialized token
    pub token_hash: String,

    /// JWT ID embedded in the token payload
    pub token_id: String,

    /// Subject (central user ID)
    pub subject: String,

    /// Product the token is scoped to
    pub product_key: String,

    /// When the token was issued
    pub issued_at: DateTime<Utc>,

    /// When the token expires
    pub expires_at: DateTime<Utc>,

    /// Client IP at issuance
    pub source_ip: Option<String>,

    /// User agent at issuance
    pub user_agent: Option<String>,

    /// Number of successful validations
    pub use_count: u64,

    /// Time of the most recent successful validation
    pub last_used_at: Option<DateTime<Utc>>,

    /// Client IP at the most recent successful validation
    pub last_used_ip: Option<String>,

    /// When the token was revoked, if ever
    pub revoked_at: Option<DateTime<Utc>>,

    /// Why the token was revoked
    pub revoked_reason: Option<String>,

    /// Who requested the revocation
    pub revoked_by: Option<String>,
}

impl TokenMetadata {
    /// Creates a fresh metadata record at issuance time.
    pub fn new(
        token_hash: String,
        token_id: String,
        subject: String,
        product_key: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        source_ip: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            token_hash,
            token_id,
            subject,
            product_key,
            issued_at,
            expires_at,
            source_ip,
            user_agent,
            use_count: 0,
            last_used_at: None,
            last_used_ip: None,
            revoked_at: None,
            revoked_reason: None,
            revoked_by: None,
        }
    }

    /// Checks if the underlying token has passed its natural expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Checks if the token has been revoked
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Stamps the record as revoked. The first stamp wins; later calls are
    /// ignored so the record stays terminal.
    pub fn revoke(&mut self, reason: &str, revoked_by: Option<&str>) -> bool {
        if self.is_revoked() {
            return false;
        }
        self.revoked_at = Some(Utc::now());
        self.revoked_reason = Some(reason.to_string());
        self.revoked_by = revoked_by.map(str::to_string);
        true
    }

    /// Records a successful validation.
    pub fn record_use(&mut self, client_ip: Option<&str>) {
        self.use_count += 1;
        self.last_used_at = Some(Utc::now());
        if let Some(ip) = client_ip {
            self.last_used_ip = Some(ip.to_string());
        }
    }

    /// IP to compare a new request against: the most recent prior use, or
    /// the issuance IP when the token has never been used.
    pub fn last_known_ip(&self) -> Option<&str> {
        self.last_used_ip.as_deref().or(self.source_ip.as_deref())
    }
}
